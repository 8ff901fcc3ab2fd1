// LabFlow - main server binary
// Run with: cargo run --bin server

use clap::Parser;
use dotenv::dotenv;
use labflow::{ServerBuilder, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "labflow-server", about = "LabFlow research lab management backend")]
struct Args {
    /// Address to bind (overrides configuration)
    #[arg(long, env = "LABFLOW_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(long, env = "LABFLOW_PORT")]
    port: Option<u16>,

    /// Disable permissive CORS
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env is optional; real deployments set the environment themselves
    let _ = dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = Settings::load()?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if args.no_cors {
        settings.cors_enabled = false;
    }

    info!("🚀 Starting LabFlow Server...");
    info!("==============================");
    info!("Server: {}:{}", settings.host, settings.port);
    info!("CORS enabled: {}", settings.cors_enabled);

    ServerBuilder::new(settings).build_and_run().await
}
