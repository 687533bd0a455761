use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use std::sync::Arc;

use super::types::*;
use crate::config::AppConfig;
use crate::inference::InferenceRequest;
use crate::models::{ArtifactDef, ALL_ROLES};
use crate::system::monitor::{ResourceMonitor, ResourceUsage};

use tokio::sync::{oneshot, Mutex};

/// Shared server state.
pub struct AppState {
    pub inference_tx: tokio::sync::mpsc::Sender<InferenceRequest>,
    pub config: AppConfig,
    pub monitor: Mutex<ResourceMonitor>,
}

pub type SharedState = Arc<AppState>;

// ============================================================================
// Form
// ============================================================================

const INDEX_HTML: &str = include_str!("index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// ============================================================================
// Image Generation
// ============================================================================

pub async fn generate_image(
    State(state): State<SharedState>,
    Json(req): Json<ImageGenerationRequest>,
) -> Result<Json<ImageGenerationResponse>, (StatusCode, Json<ApiError>)> {
    if req.prompt.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("prompt is empty", "invalid_request_error")),
        ));
    }

    let (resp_tx, resp_rx) = oneshot::channel();

    state
        .inference_tx
        .send(InferenceRequest::GenerateImage {
            prompt: req.prompt,
            negative_prompt: req.negative_prompt,
            steps: req.steps,
            cfg_scale: req.cfg_scale,
            lora_path: req.lora_path,
            response_tx: resp_tx,
        })
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Inference worker unavailable", "server_error")),
            )
        })?;

    let result = resp_rx.await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new("Inference channel closed", "server_error")),
        )
    })?;

    match result {
        Ok(image) => Ok(Json(ImageGenerationResponse {
            id: format!("imggen-{}", uuid::Uuid::new_v4()),
            created: chrono::Utc::now().timestamp(),
            data: vec![ImageData {
                b64_json: BASE64.encode(&image.png),
                output_path: image.output_path.display().to_string(),
            }],
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(e.to_string(), "server_error")),
        )),
    }
}

// ============================================================================
// System Usage
// ============================================================================

pub async fn system_usage(State(state): State<SharedState>) -> Json<ResourceUsage> {
    let mut monitor = state.monitor.lock().await;
    Json(monitor.sample())
}

// ============================================================================
// Model Artifacts
// ============================================================================

pub async fn list_artifacts(State(state): State<SharedState>) -> Json<ArtifactListResponse> {
    let models_dir = &state.config.models_dir;

    let data: Vec<ArtifactStatus> = ALL_ROLES
        .iter()
        .map(|role| {
            let variants: Vec<String> = ArtifactDef::by_role(*role)
                .filter(|a| models_dir.join(a.file_name).is_file())
                .map(|a| a.file_name.to_string())
                .collect();
            ArtifactStatus {
                role: role.to_string(),
                present: !variants.is_empty(),
                variants,
            }
        })
        .collect();

    Json(ArtifactListResponse {
        object: "list".to_string(),
        data,
    })
}
