//! Point-in-time process and accelerator resource sampling.

use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::Nvml;
use serde::Serialize;
use sysinfo::{Pid, System};
use thiserror::Error;
use tracing::{debug, error, info};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Snapshot of process and accelerator resource consumption.
///
/// Produced fresh on every sample; `Default` is the empty record reported
/// when sampling fails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceUsage {
    pub cpu_percent: f32,
    pub memory_used_gb: f64,
    pub memory_percent: f64,
    pub gpu_memory_allocated_gb: f64,
    pub gpu_memory_reserved_gb: f64,
}

#[derive(Debug, Error)]
enum MonitorError {
    #[error("process {0} not found")]
    ProcessNotFound(Pid),
    #[error("accelerator query failed: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),
}

/// Samples resource usage for the current process, for observability only.
pub struct ResourceMonitor {
    system: System,
    pid: Pid,
    nvml: Option<Nvml>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self::for_pid(Pid::from_u32(std::process::id()))
    }

    fn for_pid(pid: Pid) -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => Some(nvml),
            Err(e) => {
                debug!("accelerator memory sampling unavailable: {}", e);
                None
            }
        };
        ResourceMonitor {
            system: System::new(),
            pid,
            nvml,
        }
    }

    /// Take a snapshot, log it, and return it.
    ///
    /// Never fails: any error during sampling is logged and replaced by the
    /// empty record, so sampling cannot crash a request path.
    pub fn sample(&mut self) -> ResourceUsage {
        match self.try_sample() {
            Ok(usage) => {
                info!(
                    "resource usage: cpu {:.1}%, rss {:.2} GB ({:.1}%), gpu allocated {:.2} GB, gpu reserved {:.2} GB",
                    usage.cpu_percent,
                    usage.memory_used_gb,
                    usage.memory_percent,
                    usage.gpu_memory_allocated_gb,
                    usage.gpu_memory_reserved_gb
                );
                usage
            }
            Err(e) => {
                error!("error monitoring resources: {}", e);
                ResourceUsage::default()
            }
        }
    }

    fn try_sample(&mut self) -> Result<ResourceUsage, MonitorError> {
        self.system.refresh_memory();
        self.system.refresh_process(self.pid);
        let process = self
            .system
            .process(self.pid)
            .ok_or(MonitorError::ProcessNotFound(self.pid))?;

        let cpu_percent = process.cpu_usage();
        let rss_bytes = process.memory();
        let total_bytes = self.system.total_memory();
        let memory_percent = if total_bytes == 0 {
            0.0
        } else {
            rss_bytes as f64 / total_bytes as f64 * 100.0
        };

        let (allocated_gb, reserved_gb) = self.accelerator_memory()?;

        Ok(ResourceUsage {
            cpu_percent,
            memory_used_gb: rss_bytes as f64 / BYTES_PER_GIB,
            memory_percent,
            gpu_memory_allocated_gb: allocated_gb,
            gpu_memory_reserved_gb: reserved_gb,
        })
    }

    /// Accelerator memory attributed to this process (allocated) and in use
    /// on the device overall (reserved). Zeros when no accelerator exists.
    fn accelerator_memory(&self) -> Result<(f64, f64), MonitorError> {
        let nvml = match &self.nvml {
            Some(nvml) => nvml,
            None => return Ok((0.0, 0.0)),
        };

        let device = nvml.device_by_index(0)?;
        let reserved = device.memory_info()?.used;
        let own_pid = self.pid.as_u32();
        let allocated = device
            .running_compute_processes()?
            .into_iter()
            .filter(|p| p.pid == own_pid)
            .map(|p| match p.used_gpu_memory {
                UsedGpuMemory::Used(bytes) => bytes,
                UsedGpuMemory::Unavailable => 0,
            })
            .sum::<u64>();

        Ok((
            allocated as f64 / BYTES_PER_GIB,
            reserved as f64 / BYTES_PER_GIB,
        ))
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_is_all_zeros() {
        let usage = ResourceUsage::default();
        assert_eq!(usage.cpu_percent, 0.0);
        assert_eq!(usage.memory_used_gb, 0.0);
        assert_eq!(usage.memory_percent, 0.0);
        assert_eq!(usage.gpu_memory_allocated_gb, 0.0);
        assert_eq!(usage.gpu_memory_reserved_gb, 0.0);
    }

    #[test]
    fn sample_reports_current_process() {
        let mut monitor = ResourceMonitor::new();
        let usage = monitor.sample();
        assert!(usage.memory_used_gb > 0.0);
        assert!(usage.memory_percent > 0.0);
        assert!(usage.memory_percent <= 100.0);
    }

    #[test]
    fn sample_failure_yields_empty_record() {
        // A pid that cannot exist forces the process lookup to fail; the
        // sampler must swallow that and hand back the empty record.
        let mut monitor = ResourceMonitor::for_pid(Pid::from_u32(999_999_999));
        let usage = monitor.sample();
        assert_eq!(usage.memory_used_gb, 0.0);
        assert_eq!(usage.cpu_percent, 0.0);
    }
}
