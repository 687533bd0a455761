use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};
use tracing::{error, info, warn};

use super::{EngineError, GeneratedImage};
use crate::config::AppConfig;
use crate::models;
use crate::system::bootstrap::RuntimeFlags;
use crate::system::monitor::ResourceMonitor;
use crate::system::optimizer::ExecutionConfig;

const IMAGE_WIDTH: u32 = 512;
const IMAGE_HEIGHT: u32 = 512;

/// Flux image generation engine (placeholder for the full pipeline).
///
/// The real pipeline would load the transformer, text encoders and VAE
/// listed in the artifact catalog and run the denoising loop under the
/// selected execution configuration. None of that is wired up yet: generate
/// produces a constant white image so the surrounding plumbing (form, API,
/// outputs directory) can be exercised end to end.
pub struct ImageEngine {
    config: AppConfig,
    flags: RuntimeFlags,
    exec: ExecutionConfig,
    monitor: ResourceMonitor,
}

impl ImageEngine {
    pub fn load(
        config: AppConfig,
        flags: RuntimeFlags,
        exec: ExecutionConfig,
    ) -> Result<Self, EngineError> {
        info!("loading Flux model from {}...", config.models_dir.display());
        let t0 = Instant::now();

        if !config.models_dir.is_dir() {
            let err = EngineError::ModelDirMissing(config.models_dir.clone());
            error!("error loading model: {}", err);
            return Err(err);
        }

        let missing = models::missing_roles(&config.models_dir);
        if !missing.is_empty() {
            let roles: Vec<String> = missing.iter().map(|r| r.to_string()).collect();
            warn!(
                "no weights found for: {} (stub pipeline, continuing)",
                roles.join(", ")
            );
        }

        info!(
            "runtime flags: tf32 {}, kernel autotune {}, deterministic kernels {}",
            flags.allow_tf32, flags.kernel_autotune, flags.deterministic_kernels
        );
        match exec.attention {
            Some(backend) => info!(
                "execution config: {} precision, {} attention, batch size {}",
                exec.precision, backend, exec.batch_size
            ),
            None => info!(
                "execution config: {} precision, no attention backend, batch size {}",
                exec.precision, exec.batch_size
            ),
        }

        info!("model loaded in {:.1}s", t0.elapsed().as_secs_f64());

        Ok(ImageEngine {
            config,
            flags,
            exec,
            monitor: ResourceMonitor::new(),
        })
    }

    /// Generate an image from a text prompt and persist it as a PNG under
    /// the outputs directory. Failures are logged and returned to the
    /// caller.
    pub fn generate(
        &mut self,
        prompt: &str,
        negative_prompt: &str,
        steps: u32,
        cfg_scale: f32,
        lora_path: Option<&str>,
    ) -> Result<GeneratedImage, EngineError> {
        let result = self.try_generate(prompt, negative_prompt, steps, cfg_scale, lora_path);
        if let Err(e) = &result {
            error!("error generating image: {}", e);
        }
        result
    }

    fn try_generate(
        &mut self,
        prompt: &str,
        negative_prompt: &str,
        steps: u32,
        cfg_scale: f32,
        lora_path: Option<&str>,
    ) -> Result<GeneratedImage, EngineError> {
        info!(
            "generating image with prompt: {} ({} steps, cfg {:.1})",
            prompt, steps, cfg_scale
        );
        if !negative_prompt.is_empty() {
            info!("negative prompt: {}", negative_prompt);
        }

        self.monitor.sample();

        if let Some(path) = lora_path {
            self.resolve_adapter(path)?;
        }

        // Denoising loop not implemented: constant white image stand-in.
        let canvas = RgbImage::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, Rgb([255, 255, 255]));
        let mut png = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let file_name = format!("generated_{}.png", Utc::now().format("%Y%m%d_%H%M%S%f"));
        let output_path = self.config.outputs_dir.join(file_name);
        std::fs::write(&output_path, &png)?;
        info!("saved image to {}", output_path.display());

        Ok(GeneratedImage {
            png,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            output_path,
        })
    }

    /// Locate a LoRA adapter file. Relative paths resolve under the
    /// configured adapter directory. Weight merging itself is not
    /// implemented for the stub pipeline; a missing file is still an error
    /// so a typoed path does not silently produce unstyled output.
    fn resolve_adapter(&self, path: &str) -> Result<PathBuf, EngineError> {
        let requested = Path::new(path);
        let full = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.config.lora_dir.join(requested)
        };
        if !full.is_file() {
            return Err(EngineError::AdapterNotFound(full));
        }
        info!("applying LoRA adapter {}", full.display());
        Ok(full)
    }

    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    pub fn execution_config(&self) -> &ExecutionConfig {
        &self.exec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_in(tmp: &Path) -> ImageEngine {
        let config = AppConfig {
            volume_path: tmp.to_path_buf(),
            models_dir: tmp.join("models/flux1"),
            outputs_dir: tmp.join("outputs"),
            lora_dir: tmp.join("models/lora"),
        };
        assert!(config.ensure_dirs());
        ImageEngine::load(
            config,
            RuntimeFlags::default(),
            ExecutionConfig::for_capacity(None),
        )
        .unwrap()
    }

    #[test]
    fn load_fails_without_models_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            volume_path: tmp.path().to_path_buf(),
            models_dir: tmp.path().join("nope"),
            outputs_dir: tmp.path().join("outputs"),
            lora_dir: tmp.path().join("lora"),
        };
        let result = ImageEngine::load(
            config,
            RuntimeFlags::default(),
            ExecutionConfig::for_capacity(None),
        );
        assert!(matches!(result, Err(EngineError::ModelDirMissing(_))));
    }

    #[test]
    fn generate_writes_a_png() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = engine_in(tmp.path());
        assert_eq!(engine.execution_config().batch_size, 1);
        assert!(!engine.flags().allow_tf32);
        let image = engine.generate("a red fox", "", 30, 7.0, None).unwrap();

        assert_eq!(image.width, 512);
        assert_eq!(image.height, 512);
        assert!(image.output_path.is_file());

        let decoded = image::load_from_memory(&image.png).unwrap();
        assert_eq!(decoded.width(), 512);
        assert_eq!(decoded.height(), 512);
    }

    #[test]
    fn missing_adapter_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = engine_in(tmp.path());
        let result = engine.generate("a red fox", "", 30, 7.0, Some("style.safetensors"));
        assert!(matches!(result, Err(EngineError::AdapterNotFound(_))));
    }

    #[test]
    fn relative_adapter_resolves_under_lora_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = engine_in(tmp.path());
        std::fs::write(tmp.path().join("models/lora/style.safetensors"), b"").unwrap();
        let image = engine
            .generate("a red fox", "blurry", 20, 5.5, Some("style.safetensors"))
            .unwrap();
        assert!(image.output_path.is_file());
    }
}
