//! Network surfaces: JSON over HTTP and the WebSocket event stream.
//!
//! Both surfaces call the same [`CaseService`] operations. Those take a
//! std mutex and fsync the data files, so they run on tokio's blocking pool.

mod http;
mod socket;

#[cfg(test)]
mod tests;

pub use http::ApiError;
pub use socket::{ServerEvent, handle_frame};

use crate::config::ClientSettings;
use crate::error::{CasebookError, Result};
use crate::fanout::Fanout;
use crate::service::CaseService;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<CaseService>,
    pub fanout: Fanout,
    pub settings: ClientSettings,
}

/// Build the application router.
///
/// CORS is open to every origin: the browser client is served separately.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::health))
        .route("/api/settings", get(http::settings))
        .route(
            "/api/records",
            get(http::list_records).post(http::create_record),
        )
        .route(
            "/api/records/:case_id",
            axum::routing::put(http::update_record).delete(http::delete_record),
        )
        .route("/api/locks", get(http::list_locks))
        .route(
            "/api/locks/:case_id",
            post(http::acquire_lock).delete(http::release_lock),
        )
        .route("/api/locks/:case_id/heartbeat", post(http::renew_lock))
        .route("/ws", get(socket::upgrade))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Run a synchronous service call on the blocking pool.
async fn blocking<T, F>(service: &Arc<CaseService>, call: F) -> Result<T>
where
    F: FnOnce(&CaseService) -> T + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| CasebookError::Storage(format!("service call did not complete: {}", e)))
}
