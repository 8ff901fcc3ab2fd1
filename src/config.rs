// Configuration loading
// Defaults < optional labflow.toml < LABFLOW_* environment variables

use serde::Deserialize;

use ::config::{Config, ConfigError, Environment, File};

/// Runtime settings for the server
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Permissive CORS for browser-based clients
    pub cors_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
        }
    }
}

impl Settings {
    /// Layered load: built-in defaults, then an optional `labflow.toml` in
    /// the working directory, then `LABFLOW_HOST` / `LABFLOW_PORT` /
    /// `LABFLOW_CORS_ENABLED` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000_i64)?
            .set_default("cors_enabled", true)?
            .add_source(File::with_name("labflow").required(false))
            .add_source(Environment::with_prefix("LABFLOW"))
            .build()?
            .try_deserialize()
    }
}
