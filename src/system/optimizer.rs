//! Resource-aware execution configuration selection.

use serde::Serialize;

use super::accelerator;

/// Numeric precision the pipeline should run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float32,
    Float16,
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Float32 => write!(f, "fp32"),
            Precision::Float16 => write!(f, "fp16"),
        }
    }
}

/// Implementation strategy for the attention computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionBackend {
    Xformers,
    Sdp,
}

impl std::fmt::Display for AttentionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttentionBackend::Xformers => write!(f, "xformers"),
            AttentionBackend::Sdp => write!(f, "sdp"),
        }
    }
}

/// The {precision, attention backend, batch size} tuple used to run
/// inference. Immutable once selected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExecutionConfig {
    pub precision: Precision,
    pub attention: Option<AttentionBackend>,
    pub batch_size: u32,
}

impl ExecutionConfig {
    /// Select an execution configuration for the given accelerator memory
    /// capacity, `None` meaning no accelerator.
    ///
    /// Fixed threshold table, first match wins. Pure and deterministic.
    pub fn for_capacity(vram_gb: Option<f64>) -> Self {
        let vram_gb = match vram_gb {
            None => {
                return ExecutionConfig {
                    precision: Precision::Float32,
                    attention: None,
                    batch_size: 1,
                }
            }
            Some(gb) => gb,
        };

        if vram_gb >= 24.0 {
            ExecutionConfig {
                precision: Precision::Float16,
                attention: Some(AttentionBackend::Xformers),
                batch_size: 4,
            }
        } else if vram_gb >= 16.0 {
            ExecutionConfig {
                precision: Precision::Float16,
                attention: Some(AttentionBackend::Xformers),
                batch_size: 2,
            }
        } else {
            ExecutionConfig {
                precision: Precision::Float16,
                attention: Some(AttentionBackend::Sdp),
                batch_size: 1,
            }
        }
    }

    /// Probe the host and select accordingly. A failed capacity read counts
    /// as "no accelerator".
    pub fn detect() -> Self {
        Self::for_capacity(accelerator::probe().map(|info| info.total_memory_gb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_accelerator_gets_cpu_defaults() {
        let config = ExecutionConfig::for_capacity(None);
        assert_eq!(config.precision, Precision::Float32);
        assert_eq!(config.attention, None);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn high_memory_gets_batch_of_four() {
        for gb in [24.0, 32.0, 80.0] {
            let config = ExecutionConfig::for_capacity(Some(gb));
            assert_eq!(config.precision, Precision::Float16);
            assert_eq!(config.attention, Some(AttentionBackend::Xformers));
            assert_eq!(config.batch_size, 4, "capacity {} GB", gb);
        }
    }

    #[test]
    fn mid_memory_gets_batch_of_two() {
        for gb in [16.0, 20.0, 23.9] {
            let config = ExecutionConfig::for_capacity(Some(gb));
            assert_eq!(config.precision, Precision::Float16);
            assert_eq!(config.attention, Some(AttentionBackend::Xformers));
            assert_eq!(config.batch_size, 2, "capacity {} GB", gb);
        }
    }

    #[test]
    fn low_memory_falls_back_to_sdp() {
        for gb in [0.5, 8.0, 10.0, 15.9] {
            let config = ExecutionConfig::for_capacity(Some(gb));
            assert_eq!(config.precision, Precision::Float16);
            assert_eq!(config.attention, Some(AttentionBackend::Sdp));
            assert_eq!(config.batch_size, 1, "capacity {} GB", gb);
        }
    }
}
