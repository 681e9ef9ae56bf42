//! Accelerator detection, performed once before launch.

use std::process::{Command, Stdio};

use tracing::{info, warn};
use xtts_config::HardwareSettings;
use xtts_core::HardwareMode;

/// Decide the hardware mode for this launch. `force_cpu` short-circuits the
/// probe entirely; a missing or failing `nvidia-smi` means no accelerator.
pub fn detect(settings: &HardwareSettings) -> HardwareMode {
    detect_with(settings, nvidia_smi_succeeds)
}

pub fn detect_with(settings: &HardwareSettings, probe: impl Fn() -> bool) -> HardwareMode {
    if settings.force_cpu {
        info!("accelerator probe skipped, CPU mode forced");
        return HardwareMode::Cpu;
    }
    if probe() {
        if settings.low_vram {
            info!("accelerator detected, reduced-memory mode requested");
            HardwareMode::GpuLowVram
        } else {
            info!("accelerator detected");
            HardwareMode::Gpu
        }
    } else {
        warn!("no accelerator detected, continuing in degraded CPU mode");
        HardwareMode::Cpu
    }
}

fn nvidia_smi_succeeds() -> bool {
    Command::new("nvidia-smi")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(force_cpu: bool, low_vram: bool) -> HardwareSettings {
        HardwareSettings { force_cpu, low_vram }
    }

    #[test]
    fn force_cpu_skips_the_probe() {
        let mode = detect_with(&hints(true, false), || panic!("probe must not run"));
        assert_eq!(mode, HardwareMode::Cpu);
        assert!(!mode.is_accelerated());
    }

    #[test]
    fn accelerator_present_selects_gpu() {
        assert_eq!(detect_with(&hints(false, false), || true), HardwareMode::Gpu);
    }

    #[test]
    fn low_vram_hint_constrains_an_available_accelerator() {
        let mode = detect_with(&hints(false, true), || true);
        assert_eq!(mode, HardwareMode::GpuLowVram);
        assert!(mode.is_accelerated());
    }

    #[test]
    fn probe_failure_falls_back_to_cpu() {
        assert_eq!(detect_with(&hints(false, true), || false), HardwareMode::Cpu);
    }
}
