use std::path::{Path, PathBuf};

use tracing::error;

/// Paths the server reads and writes, resolved once at startup.
///
/// Everything is rooted under a network volume (RunPod convention) so a
/// rented instance can keep models and outputs across restarts. Each path
/// can be overridden individually through the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base volume mount. `RUNPOD_VOLUME_PATH`, default `/runpod-volume`.
    pub volume_path: PathBuf,
    /// Model weights directory. `MODELS_DIR`, default `{volume}/models/flux1`.
    pub models_dir: PathBuf,
    /// Generated images directory. `OUTPUTS_DIR`, default `{volume}/outputs`.
    pub outputs_dir: PathBuf,
    /// LoRA adapter directory. `LORA_DIR`, default `{volume}/models/lora`.
    pub lora_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// `models_dir_override` (from `--models-dir`) wins over the
    /// `MODELS_DIR` environment variable.
    pub fn load(models_dir_override: Option<&str>) -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        if let Some(dir) = models_dir_override {
            config.models_dir = PathBuf::from(dir);
        }
        config
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let volume_path =
            PathBuf::from(get("RUNPOD_VOLUME_PATH").unwrap_or_else(|| "/runpod-volume".into()));
        let models_dir = get("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| volume_path.join("models/flux1"));
        let outputs_dir = get("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| volume_path.join("outputs"));
        let lora_dir = get("LORA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| volume_path.join("models/lora"));

        AppConfig {
            volume_path,
            models_dir,
            outputs_dir,
            lora_dir,
        }
    }

    /// Create the models, outputs and LoRA directories if they are missing.
    ///
    /// Idempotent. Returns false if any creation failed; failures are
    /// logged, never raised.
    pub fn ensure_dirs(&self) -> bool {
        [&self.models_dir, &self.outputs_dir, &self.lora_dir]
            .iter()
            .all(|dir| ensure_dir(dir))
    }

    /// Ensure a directory exists under the volume, parents included.
    ///
    /// Idempotent: calling twice with the same path succeeds both times.
    pub fn ensure_path(&self, relative: impl AsRef<Path>) -> bool {
        ensure_dir(&self.volume_path.join(relative))
    }
}

fn ensure_dir(path: &Path) -> bool {
    match std::fs::create_dir_all(path) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to create directory {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(volume: &Path) -> AppConfig {
        let vol = volume.to_string_lossy().to_string();
        AppConfig::from_lookup(move |key| match key {
            "RUNPOD_VOLUME_PATH" => Some(vol.clone()),
            _ => None,
        })
    }

    #[test]
    fn default_paths_root_under_volume() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.volume_path, PathBuf::from("/runpod-volume"));
        assert_eq!(config.models_dir, PathBuf::from("/runpod-volume/models/flux1"));
        assert_eq!(config.outputs_dir, PathBuf::from("/runpod-volume/outputs"));
        assert_eq!(config.lora_dir, PathBuf::from("/runpod-volume/models/lora"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = AppConfig::from_lookup(|key| match key {
            "RUNPOD_VOLUME_PATH" => Some("/mnt/vol".into()),
            "OUTPUTS_DIR" => Some("/tmp/out".into()),
            _ => None,
        });
        assert_eq!(config.outputs_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.models_dir, PathBuf::from("/mnt/vol/models/flux1"));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        assert!(config.ensure_dirs());
        assert!(config.ensure_dirs());
        assert!(config.models_dir.is_dir());
        assert!(config.outputs_dir.is_dir());
        assert!(config.lora_dir.is_dir());
    }

    #[test]
    fn ensure_path_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        assert!(config.ensure_path("models/lora/styles"));
        assert!(tmp.path().join("models/lora/styles").is_dir());
        // Second call is a no-op, not an error.
        assert!(config.ensure_path("models/lora/styles"));
    }
}
