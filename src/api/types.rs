use serde::{Deserialize, Serialize};

// ============================================================================
// Image Generation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f32,
    #[serde(default)]
    pub lora_path: Option<String>,
}

fn default_steps() -> u32 {
    30
}

fn default_cfg_scale() -> f32 {
    7.0
}

#[derive(Debug, Serialize)]
pub struct ImageGenerationResponse {
    pub id: String,
    pub created: i64,
    pub data: Vec<ImageData>,
}

#[derive(Debug, Serialize)]
pub struct ImageData {
    pub b64_json: String,
    pub output_path: String,
}

// ============================================================================
// Model Artifacts
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ArtifactStatus {
    pub role: String,
    pub present: bool,
    pub variants: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactListResponse {
    pub object: String,
    pub data: Vec<ArtifactStatus>,
}

// ============================================================================
// Error
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        ApiError {
            error: ApiErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
            },
        }
    }
}
