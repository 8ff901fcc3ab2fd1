// Server assembly
// Wires store -> notifier -> engine -> router and runs the axum server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::api::{create_router, ApiState};
use crate::config::Settings;
use crate::engine::events::Notifier;
use crate::engine::workflow::ReviewEngine;
use crate::realtime::ConnectionManager;
use crate::store::{InMemoryStore, LabStore};

/// Builder for a fully wired LabFlow server
///
/// By default the server runs on the in-memory store; deployments with a
/// real database inject their own [`LabStore`] implementation via
/// [`ServerBuilder::with_store`]. The connection manager is constructed
/// here, once, and shared by the router and the notifier for the life of
/// the process.
pub struct ServerBuilder {
    settings: Settings,
    store: Option<Arc<dyn LabStore>>,
}

impl ServerBuilder {
    pub fn new(settings: Settings) -> Self {
        ServerBuilder {
            settings,
            store: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    pub fn with_host<H: Into<String>>(mut self, host: H) -> Self {
        self.settings.host = host.into();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn LabStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Assemble the application router without binding a listener.
    /// Used by the run path and handy for in-process testing.
    pub fn build_router(&self) -> Router {
        let store = self
            .store
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let connections = Arc::new(ConnectionManager::new());
        let notifier = Notifier::new(store.clone(), connections.clone());
        let engine = Arc::new(ReviewEngine::new(store.clone(), notifier));

        let state = ApiState {
            engine,
            store,
            connections,
        };
        create_router(state, self.settings.cors_enabled)
    }

    /// Build the server and run it until the process is stopped
    pub async fn build_and_run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = format!("{}:{}", self.settings.host, self.settings.port).parse()?;
        let app = self.build_router();

        info!("🚀 LabFlow server listening on http://{}", addr);
        info!("🔗 API endpoints:");
        info!("   POST http://{}/research-logs", addr);
        info!("   POST http://{}/research-logs/:id/submit", addr);
        info!("   GET  http://{}/research-logs", addr);
        info!("   GET  http://{}/ws  (per-user push channel)", addr);
        info!("   GET  http://{}/health", addr);

        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await?;
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
