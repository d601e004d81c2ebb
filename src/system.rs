//! Host telemetry returned on GET requests

use serde::{Deserialize, Serialize};
use sysinfo::System;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "HostName")]
    pub host_name: String,
    #[serde(rename = "KernelVersion")]
    pub kernel_version: String,
    #[serde(rename = "LogicalCpuCores")]
    pub logical_cpu_cores: usize,
    #[serde(rename = "PhysicalCpuCores")]
    pub physical_cpu_cores: usize,
    #[serde(rename = "CpuMHZ")]
    pub cpu_mhz: f64,
    /// Total memory, e.g. `15923mb`.
    #[serde(rename = "Memory")]
    pub memory: String,
}

/// Take a fresh snapshot of the host. Blocking; call it off the async
/// executor.
pub fn describe_system() -> SystemInfo {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let cpu_mhz = sys
        .cpus()
        .iter()
        .map(|cpu| cpu.frequency())
        .find(|mhz| *mhz > 0)
        .unwrap_or(0) as f64;

    SystemInfo {
        host_name: System::host_name()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        kernel_version: System::kernel_version().unwrap_or_default(),
        logical_cpu_cores: num_cpus::get(),
        physical_cpu_cores: num_cpus::get_physical(),
        cpu_mhz,
        memory: format!("{}mb", sys.total_memory() / 1024 / 1024),
    }
}
