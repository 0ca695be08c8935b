// device.rs — Compute device selection for training.

use candle_core::Device;

use crate::config;

/// Hardware class the run is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareProfile {
    Accelerator,
    Cpu,
}

impl HardwareProfile {
    pub fn batch_size(self) -> usize {
        match self {
            HardwareProfile::Accelerator => config::training::ACCELERATOR_BATCH_SIZE,
            HardwareProfile::Cpu => config::training::CPU_BATCH_SIZE,
        }
    }

    pub fn mixed_precision(self) -> bool {
        matches!(self, HardwareProfile::Accelerator)
    }

    pub fn label(self) -> &'static str {
        match self {
            HardwareProfile::Accelerator => "cuda",
            HardwareProfile::Cpu => "cpu",
        }
    }
}

/// Pick CUDA when compiled in and a device opens, else CPU.
pub fn select_device() -> (Device, HardwareProfile) {
    #[cfg(feature = "cuda")]
    {
        if candle_core::utils::cuda_is_available() {
            match Device::new_cuda(0) {
                Ok(device) => {
                    log::info!("✅ GPU detected - using GPU for training");
                    return (device, HardwareProfile::Accelerator);
                }
                Err(e) => log::warn!("CUDA device unavailable: {e}"),
            }
        }
    }

    log::warn!("⚠️  No GPU detected - training on CPU (will be slower)");
    (Device::Cpu, HardwareProfile::Cpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_settings() {
        assert_eq!(HardwareProfile::Accelerator.batch_size(), 128);
        assert!(HardwareProfile::Accelerator.mixed_precision());
        assert_eq!(HardwareProfile::Cpu.batch_size(), 32);
        assert!(!HardwareProfile::Cpu.mixed_precision());
    }
}
