//! `invaudit-server`: HTTP front end for the reconciliation engine.
//!
//! Multipart uploads are read into memory, run through the engine and
//! returned as XLSX attachments. Nothing is written to disk.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use invaudit_config::{ServerSettings, Settings};
use invaudit_recon::Auditor;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::{ApiError, ServerError};
pub use state::AppState;

/// All routes with CORS, upload limit and request tracing applied.
pub fn router(state: AppState, server: &ServerSettings) -> Result<Router, ServerError> {
    let origins = server
        .allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o).map_err(|_| ServerError::Origin(o.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(routes::health))
        .route("/compare", post(routes::compare))
        .route("/blank", post(routes::blind_template))
        .route("/blind-template", post(routes::blind_template))
        .route("/bin-template", post(routes::bin_template))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Build the engine from settings and serve until Ctrl-C.
pub async fn serve(settings: &Settings, bind: Option<SocketAddr>) -> Result<(), ServerError> {
    let addr = match bind {
        Some(addr) => addr,
        None => settings.server.bind_addr()?,
    };
    let auditor = Auditor::new(&settings.loader)?;
    let app = router(AppState::new(auditor, &settings.report), &settings.server)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local = listener.local_addr().unwrap_or(addr);
    info!(addr = %local, origins = ?settings.server.allowed_origins, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => warn!("cannot listen for Ctrl-C: {e}"),
    }
}
