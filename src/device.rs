//! Compute device selection
//!
//! Inference runs on the CPU backend by default. A CUDA device variant is
//! compiled in behind the `cuda` feature; selection prefers the accelerator
//! when one is compiled in.

use crate::precision::Precision;

/// A compute device for model placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// General-purpose CPU execution
    #[default]
    Cpu,
    /// CUDA accelerator, by ordinal
    #[cfg(feature = "cuda")]
    Cuda(usize),
}

impl Device {
    /// Pick the preferred device: the accelerator when compiled in, else CPU
    pub fn preferred() -> Self {
        #[cfg(feature = "cuda")]
        {
            Device::Cuda(0)
        }
        #[cfg(not(feature = "cuda"))]
        {
            Device::Cpu
        }
    }

    /// Human-readable device name
    pub fn name(&self) -> String {
        match self {
            Device::Cpu => "cpu".to_string(),
            #[cfg(feature = "cuda")]
            Device::Cuda(ordinal) => format!("cuda:{ordinal}"),
        }
    }

    /// The reduced precision this device supports under autocast
    ///
    /// Devices without a native half-precision path use the bf16
    /// round-through fallback.
    pub fn autocast_precision(&self) -> Precision {
        match self {
            Device::Cpu => Precision::Bf16,
            #[cfg(feature = "cuda")]
            Device::Cuda(_) => Precision::Fp16,
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_cpu() {
        assert_eq!(Device::default(), Device::Cpu);
    }

    #[test]
    fn test_cpu_autocast_falls_back_to_bf16() {
        assert_eq!(Device::Cpu.autocast_precision(), Precision::Bf16);
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_preferred_without_accelerator() {
        assert_eq!(Device::preferred(), Device::Cpu);
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn test_preferred_with_accelerator() {
        assert_eq!(Device::preferred(), Device::Cuda(0));
    }

    #[test]
    fn test_name() {
        assert_eq!(Device::Cpu.name(), "cpu");
    }
}
