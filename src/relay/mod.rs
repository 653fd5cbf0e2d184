// Request relay - HTTP front that forwards browser calls to the fixed upstreams

pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::adapters::http_upstream::build_client;
use crate::adapters::{AppConfig, UpstreamEndpoints};
use crate::domain::errors::DomainError;
use crate::error::{TrimmerError, TrimmerResult};

pub use error::{RelayError, RelayResult};

/// Connect timeout for proxied downloads; the transfer itself is unbounded
const PROXY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared handler state
#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub proxy_client: reqwest::Client,
    pub endpoints: Arc<UpstreamEndpoints>,
}

impl RelayState {
    pub fn new(endpoints: UpstreamEndpoints, timeout: Duration) -> Result<Self, DomainError> {
        let proxy_client = reqwest::Client::builder()
            .connect_timeout(PROXY_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DomainError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: build_client(timeout)?,
            proxy_client,
            endpoints: Arc::new(endpoints),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Self::new(
            UpstreamEndpoints::from_config(config),
            config.request_timeout(),
        )
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/trim", post(handlers::trim))
        .route("/api/download", post(handlers::download))
        .route(
            "/api/merge",
            post(handlers::start_merge).get(handlers::merge_status),
        )
        .route("/api/file-check", get(handlers::file_check))
        .route("/api/proxy", get(handlers::proxy))
        .with_state(state)
}

/// Serve the relay on `listener` until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, state: RelayState, shutdown: F) -> TrimmerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Relay listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TrimmerError::ServerError {
            message: e.to_string(),
        })?;

    info!("Relay stopped");
    Ok(())
}

/// Bind `config.bind_addr` and serve until Ctrl+C
pub async fn serve(config: &AppConfig) -> TrimmerResult<()> {
    let state = RelayState::from_config(config)?;
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| TrimmerError::ServerError {
            message: format!("Failed to bind {}: {}", config.bind_addr, e),
        })?;
    run(listener, state, shutdown_signal()).await
}

/// Resolves on Ctrl+C. Without a usable handler it never resolves, so the
/// relay keeps serving until the process is killed.
async fn shutdown_signal() {
    shutdown_on(signal::ctrl_c()).await
}

async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
