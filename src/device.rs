//! # Device Detection and Management
//!
//! Maps the configured inference target (CPU or GPU) onto candle devices.
//! Provides the runtime downgrade to CPU when no GPU is present.

use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Cached GPU availability to avoid repeated driver probing
static GPU_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Inference target for a transcription model.
///
/// The device also drives the parallelism policy: only GPU batches are
/// dispatched to more than one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Gpu,
}

impl std::str::FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" | "metal" => Ok(Device::Gpu),
            _ => Err(format!("Unknown device: {}", s)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu => write!(f, "cuda"),
        }
    }
}

/// Device detection and selection utilities
pub struct DeviceManager;

impl DeviceManager {
    /// Downgrade a GPU request to CPU when no GPU can be opened.
    pub fn resolve(requested: Device) -> Device {
        match requested {
            Device::Gpu if !Self::is_gpu_available() => {
                warn!("GPU device not found. Transcription will use CPU, which is significantly slower.");
                Device::Cpu
            }
            other => other,
        }
    }

    /// Check if any GPU is available (cached)
    pub fn is_gpu_available() -> bool {
        *GPU_AVAILABLE.get_or_init(|| {
            let available = Self::get_cuda_device().is_some() || Self::get_metal_device().is_some();
            info!("GPU acceleration available: {}", available);
            available
        })
    }

    /// Open the candle device backing a configured target.
    ///
    /// Every call opens a fresh handle, so each worker owns its own device context.
    pub fn open(device: Device) -> anyhow::Result<candle_core::Device> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Gpu => Self::get_cuda_device()
                .or_else(Self::get_metal_device)
                .ok_or_else(|| anyhow::anyhow!("no CUDA or Metal device could be opened")),
        }
    }

    fn get_cuda_device() -> Option<candle_core::Device> {
        match candle_core::Device::new_cuda(0) {
            Ok(device) => {
                debug!("CUDA device 0 available");
                Some(device)
            }
            Err(e) => {
                debug!("CUDA not available: {}", e);
                None
            }
        }
    }

    fn get_metal_device() -> Option<candle_core::Device> {
        match candle_core::Device::new_metal(0) {
            Ok(device) => {
                debug!("Metal device 0 available");
                Some(device)
            }
            Err(e) => {
                debug!("Metal not available: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Gpu);
        assert_eq!(" gpu ".parse::<Device>().unwrap(), Device::Gpu);
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_cpu_is_never_downgraded() {
        assert_eq!(DeviceManager::resolve(Device::Cpu), Device::Cpu);
        assert!(matches!(DeviceManager::open(Device::Cpu).unwrap(), candle_core::Device::Cpu));
    }
}
