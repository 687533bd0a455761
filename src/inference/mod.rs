pub mod image_gen;

use std::path::PathBuf;

use thiserror::Error;

/// Request routed to the inference worker thread.
pub enum InferenceRequest {
    /// Text-to-image generation
    GenerateImage {
        prompt: String,
        negative_prompt: String,
        steps: u32,
        cfg_scale: f32,
        lora_path: Option<String>,
        response_tx: tokio::sync::oneshot::Sender<Result<GeneratedImage, EngineError>>,
    },
    /// Shutdown
    Shutdown,
}

/// One finished generation: encoded PNG plus where it was persisted.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub output_path: PathBuf,
}

/// Failures that surface to the caller. Unlike bootstrap and sampling
/// errors, these are not absorbed: the HTTP layer reports them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model directory not found: {0}")]
    ModelDirMissing(PathBuf),
    #[error("LoRA adapter not found: {0}")]
    AdapterNotFound(PathBuf),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
