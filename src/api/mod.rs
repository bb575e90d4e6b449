mod convert;
mod error;
mod handlers;
mod middleware;
mod state;
mod types;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use log::{info, warn};
use tokio::sync::Notify;

use crate::core::TallyError;

pub use convert::to_responses;
pub use error::ApiError;
pub use state::AppState;
pub use types::{FetchRequest, FetchResponse, KeyValue, RecordResponse};

pub struct TallyApi {
    state: AppState,
}

impl TallyApi {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health).fallback(handlers::not_found))
            .route("/fetch", post(handlers::fetch).fallback(handlers::not_found))
            .route(
                "/in-memory",
                get(handlers::get_value)
                    .post(handlers::set_value)
                    .fallback(handlers::not_found),
            )
            .fallback(handlers::not_found)
            .layer(axum::middleware::from_fn(middleware::log_request))
            .with_state(self.state.clone())
    }

    /// Serves until `shutdown` resolves, then gives in-flight requests up to
    /// `drain_timeout` to finish.
    pub async fn serve<F>(
        self,
        addr: &str,
        shutdown: F,
        drain_timeout: Duration,
    ) -> Result<(), TallyError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TallyError::IoError(format!("binding to {addr}: {e}")))?;
        info!("Server started on {}", addr);

        let draining = Arc::new(Notify::new());
        let signal = draining.clone();
        let server = axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            signal.notify_one();
        })
        .into_future();

        tokio::select! {
            result = server => {
                result.map_err(|e| TallyError::IoError(format!("serving: {e}")))?;
            }
            _ = async {
                draining.notified().await;
                tokio::time::sleep(drain_timeout).await;
            } => {
                warn!("In-flight requests still running after {:?}, stopping", drain_timeout);
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Like [`TallyApi::serve`], but closes the document store afterwards
    /// whether or not serving succeeded. A serving error wins over a
    /// disconnect error.
    pub async fn run<F>(
        self,
        addr: &str,
        shutdown: F,
        drain_timeout: Duration,
    ) -> Result<(), TallyError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let documents = self.state.documents.clone();
        let served = self.serve(addr, shutdown, drain_timeout).await;
        let disconnected = documents.disconnect().await;
        served.and(disconnected)
    }
}
