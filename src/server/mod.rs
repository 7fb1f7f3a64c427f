//! HTTP service.
//!
//! [`Service::start`] binds the listener and serves the router on a
//! background task; the returned [`RunningService`] owns the socket until
//! [`RunningService::stop`] shuts it down gracefully.
//!
//! Routes:
//!
//! - `GET /` health check
//! - `GET /topdf?pdf=<url>&pdf=<url>&pdfDir=<dir>&options=<json>`

pub mod handlers;
pub mod query;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::convert::Orchestrator;
use crate::error::{Result, UrlCatError};
use crate::render::Renderer;

pub use handlers::{ApiResponse, SUCCESS_MESSAGE, handle_health, handle_topdf};
pub use query::TopdfQuery;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Conversion pipeline.
    pub orchestrator: Arc<Orchestrator>,

    /// Service configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// State built from the service configuration.
    pub fn new(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::from_config(config, renderer)),
            config: Arc::new(config.clone()),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/topdf", get(handle_topdf))
        .with_state(state)
}

/// Entry point for starting the HTTP service.
pub struct Service;

impl Service {
    /// Bind `config.listen_addr()` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the address
    /// cannot be bound.
    pub async fn start(config: Config, renderer: Arc<dyn Renderer>) -> Result<RunningService> {
        config.validate()?;
        let addr = config.listen_addr()?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            UrlCatError::invalid_config(format!("Failed to bind {addr}: {e}"))
        })?;
        let local_addr = listener.local_addr()?;

        let app = router(AppState::new(&config, Arc::clone(&renderer)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(
            op = "server::start",
            result = "ok",
            addr = %local_addr,
            renderer = renderer.name(),
            base_dir = %config.base_dir.display(),
            "Listening"
        );

        Ok(RunningService {
            local_addr,
            shutdown: shutdown_tx,
            handle,
        })
    }
}

/// A started service.
#[derive(Debug)]
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningService {
    /// The bound address (resolves port 0 to the actual port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections, finish in-flight requests, and wait for
    /// the server task to exit.
    pub async fn stop(self) -> Result<()> {
        // The receiver is gone only if the server already exited
        let _ = self.shutdown.send(());
        self.handle.await??;

        info!(op = "server::stop", result = "ok", addr = %self.local_addr, "Stopped");
        Ok(())
    }
}
