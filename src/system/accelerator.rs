//! NVML-backed accelerator probe.

use nvml_wrapper::Nvml;
use tracing::debug;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Identity and capacity of the first accelerator, as reported by NVML.
#[derive(Debug, Clone)]
pub struct AcceleratorInfo {
    pub name: String,
    pub total_memory_gb: f64,
}

/// Probe for an accelerator.
///
/// Any failure along the way (driver library not present, no device,
/// query error) is treated as "no accelerator" rather than an error, so
/// the server comes up on CPU-only hosts without complaint.
pub fn probe() -> Option<AcceleratorInfo> {
    match try_probe() {
        Ok(info) => Some(info),
        Err(e) => {
            debug!("no accelerator detected: {}", e);
            None
        }
    }
}

fn try_probe() -> Result<AcceleratorInfo, nvml_wrapper::error::NvmlError> {
    let nvml = Nvml::init()?;
    let device = nvml.device_by_index(0)?;
    let name = device.name()?;
    let memory = device.memory_info()?;
    Ok(AcceleratorInfo {
        name,
        total_memory_gb: memory.total as f64 / BYTES_PER_GIB,
    })
}
