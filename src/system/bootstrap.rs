//! One-shot process environment setup.

use std::process::Command;

use tracing::{debug, error, info};

use super::accelerator;

/// Numeric/execution flags applied for the lifetime of the process.
///
/// Constructed once at startup and handed to the engine, instead of being
/// hidden process-global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// Allow reduced-precision (TF32) matrix multiplication.
    pub allow_tf32: bool,
    /// Let the kernel library benchmark and auto-tune algorithm choices.
    pub kernel_autotune: bool,
    /// Restrict kernel selection to deterministic implementations.
    pub deterministic_kernels: bool,
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        RuntimeFlags {
            allow_tf32: false,
            kernel_autotune: false,
            deterministic_kernels: false,
        }
    }
}

impl RuntimeFlags {
    /// Flags for an accelerator-bearing host: trade determinism for speed.
    pub fn accelerated() -> Self {
        RuntimeFlags {
            allow_tf32: true,
            kernel_autotune: true,
            deterministic_kernels: false,
        }
    }
}

/// Apply process-wide tuning once at startup.
///
/// On an accelerator-bearing host this selects the accelerated flag set and
/// logs the device name and memory capacity; on a CPU-only host the step is
/// skipped silently. Lowering the scheduling priority is attempted either
/// way and denial is ignored. This function never fails: bootstrap problems
/// are logged and conservative defaults returned, so setup can never keep
/// the rest of the process from starting.
pub fn setup_environment() -> RuntimeFlags {
    let flags = match accelerator::probe() {
        Some(info) => {
            info!("accelerator available: {}", info.name);
            info!("accelerator memory: {:.2} GB", info.total_memory_gb);
            RuntimeFlags::accelerated()
        }
        None => RuntimeFlags::default(),
    };

    lower_process_priority();

    info!("environment setup completed");
    flags
}

/// Best effort renice of the current process to +10.
///
/// Fails with EPERM in unprivileged containers; that (and a missing renice
/// binary) is expected and ignored.
fn lower_process_priority() {
    let pid = std::process::id().to_string();
    match Command::new("renice").args(["-n", "10", "-p", &pid]).output() {
        Ok(output) if output.status.success() => {
            debug!("process priority lowered to +10");
        }
        Ok(output) => {
            debug!(
                "renice denied: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(e) => {
            error!("failed to run renice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_never_panics_and_flags_are_consistent() {
        let flags = setup_environment();
        // Whichever host this runs on, deterministic kernels stay off and
        // the speed flags come as a pair.
        assert!(!flags.deterministic_kernels);
        assert_eq!(flags.allow_tf32, flags.kernel_autotune);
    }

    #[test]
    fn default_flags_are_conservative() {
        let flags = RuntimeFlags::default();
        assert!(!flags.allow_tf32);
        assert!(!flags.kernel_autotune);
    }
}
