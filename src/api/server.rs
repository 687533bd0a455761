use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tracing::info;

use super::handlers::{self, AppState};
use crate::config::AppConfig;
use crate::inference::InferenceRequest;
use crate::system::monitor::ResourceMonitor;

/// Bind on all interfaces and serve until the process is stopped.
pub async fn start_server(
    port: u16,
    inference_tx: tokio::sync::mpsc::Sender<InferenceRequest>,
    config: AppConfig,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        inference_tx,
        config,
        monitor: Mutex::new(ResourceMonitor::new()),
    });

    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/v1/images/generations", post(handlers::generate_image))
        .route("/v1/system/usage", get(handlers::system_usage))
        .route("/v1/models/artifacts", get(handlers::list_artifacts))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
