// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Host resource probe backed by `sysinfo` and `nvidia-smi`.

use loadmatrix_common::ProbeReading;
use loadmatrix_engine::ResourceProbe;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tokio::process::Command;
use tracing::{debug, warn};

const NVIDIA_SMI: &str = "nvidia-smi";
const NVIDIA_SMI_ARGS: [&str; 2] = [
    "--query-gpu=utilization.gpu,memory.used",
    "--format=csv,noheader,nounits",
];

/// Percentage of memory in use, counting reclaimable memory as free.
pub fn memory_used_pct(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(total.saturating_sub(available) as f64 / total as f64 * 100.0)
}

/// `(utilization %, memory used MiB)` from `nvidia-smi` csv output. With several devices the
/// busiest device's utilization and the total memory in use are reported.
pub fn parse_nvidia_smi(output: &str) -> Option<(f64, f64)> {
    let mut devices = 0;
    let mut util = 0.0_f64;
    let mut mem = 0.0_f64;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut fields = line.split(',').map(str::trim);
        let (Some(u), Some(m), None) = (fields.next(), fields.next(), fields.next()) else {
            return None;
        };
        util = util.max(u.parse().ok()?);
        mem += m.parse::<f64>().ok()?;
        devices += 1;
    }
    (devices > 0).then_some((util, mem))
}

/// Reads host CPU and memory load through `sysinfo`, and accelerator load through
/// `nvidia-smi`. The child process is killed if the sampler abandons a slow call.
pub struct HostProbe {
    system: Arc<Mutex<System>>,
    accelerator_available: AtomicBool,
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between refreshes; take the baseline now.
        if sysinfo::IS_SUPPORTED_SYSTEM {
            system.refresh_cpu_usage();
        }
        Self {
            system: Arc::new(Mutex::new(system)),
            accelerator_available: AtomicBool::new(true),
        }
    }

    /// `(cpu %, memory used %)`
    async fn host_load(&self) -> (Option<f64>, Option<f64>) {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return (None, None);
        }
        let system = self.system.clone();
        tokio::task::spawn_blocking(move || {
            let mut system = system.lock().unwrap_or_else(|e| e.into_inner());
            system.refresh_cpu_usage();
            system.refresh_memory();
            (
                Some(f64::from(system.global_cpu_usage())),
                memory_used_pct(system.total_memory(), system.available_memory()),
            )
        })
        .await
        .unwrap_or_else(|e| {
            debug!("Host load refresh terminated abnormally: {e}");
            (None, None)
        })
    }

    async fn accelerator(&self) -> Option<(f64, f64)> {
        if !self.accelerator_available.load(Ordering::Relaxed) {
            return None;
        }
        let output = match Command::new(NVIDIA_SMI)
            .args(NVIDIA_SMI_ARGS)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{NVIDIA_SMI} not found; accelerator load will not be measured");
                self.accelerator_available.store(false, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                debug!("Unable to run {NVIDIA_SMI}: {e}");
                return None;
            }
        };
        if !output.status.success() {
            debug!("{NVIDIA_SMI} exited with {}", output.status);
            return None;
        }
        parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout))
    }
}

impl ResourceProbe for HostProbe {
    async fn sample(&self) -> ProbeReading {
        let ((cpu_load, memory_used_pct), accelerator) =
            tokio::join!(self.host_load(), self.accelerator());
        ProbeReading {
            cpu_load,
            memory_used_pct,
            accelerator_load: accelerator.map(|(util, _)| util),
            accelerator_memory_used: accelerator.map(|(_, mem)| mem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_used_pct() {
        assert_eq!(memory_used_pct(16_000, 4_000), Some(75.0));
        assert_eq!(memory_used_pct(16_000, 16_000), Some(0.0));
        // Available briefly above total must not underflow.
        assert_eq!(memory_used_pct(16_000, 16_500), Some(0.0));
        assert_eq!(memory_used_pct(0, 0), None);
    }

    #[test]
    fn test_parse_nvidia_smi() {
        assert_eq!(parse_nvidia_smi("37, 2048\n"), Some((37.0, 2048.0)));
        assert_eq!(
            parse_nvidia_smi("12, 1000\n88, 3000\n"),
            Some((88.0, 4000.0))
        );
        assert_eq!(parse_nvidia_smi(""), None);
        assert_eq!(parse_nvidia_smi("[N/A], 100\n"), None);
        assert_eq!(parse_nvidia_smi("12, 1000, 5\n"), None);
    }

    #[tokio::test]
    async fn test_probe_never_fails_as_a_whole() {
        let probe = HostProbe::new();
        let reading = probe.sample().await;
        let sample = reading.to_sample();
        assert!(sample.cpu_load >= 0.0 && sample.cpu_load <= 100.0);
        assert!(sample.memory_used_pct >= 0.0 && sample.memory_used_pct <= 100.0);
    }
}
