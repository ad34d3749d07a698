//! Data structures for host health samples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes in one mebibyte.
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// The four host resources the engine samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl Metric {
    /// All metrics in evaluation order.
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Memory, Metric::Disk, Metric::Network];

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Metric::Cpu => 0,
            Metric::Memory => 1,
            Metric::Disk => 2,
            Metric::Network => 3,
        }
    }

    /// Lowercase identifier used in logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::Disk => "disk",
            Metric::Network => "network",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation's worth of host samples.
///
/// All four fields come from the same evaluation call. Records are only ever
/// built whole; there is no partially populated form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// CPU utilization percentage (0.0 to 100.0)
    pub cpu_percent: f64,
    /// Physical memory in use (0.0 to 100.0)
    pub memory_percent: f64,
    /// Space in use on the configured filesystem (0.0 to 100.0)
    pub disk_percent: f64,
    /// Cumulative bytes received plus sent since the OS counters were reset
    pub network_bytes: u64,
}

impl HealthRecord {
    /// Assemble a record from four samples.
    pub fn new(cpu_percent: f64, memory_percent: f64, disk_percent: f64, network_bytes: u64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            disk_percent,
            network_bytes,
        }
    }

    /// Network counter expressed in MiB.
    pub fn network_mib(&self) -> f64 {
        self.network_bytes as f64 / BYTES_PER_MIB as f64
    }

    /// Percentage reading for a percent-based metric. `None` for network.
    pub fn percent(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => Some(self.cpu_percent),
            Metric::Memory => Some(self.memory_percent),
            Metric::Disk => Some(self.disk_percent),
            Metric::Network => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::Cpu.to_string(), "cpu");
        assert_eq!(Metric::Network.to_string(), "network");
        assert_eq!(serde_json::to_string(&Metric::Disk).unwrap(), "\"disk\"");
    }

    #[test]
    fn test_network_mib() {
        let record = HealthRecord::new(0.0, 0.0, 0.0, 100 * BYTES_PER_MIB);
        assert_eq!(record.network_mib(), 100.0);
        assert_eq!(record.percent(Metric::Network), None);
        assert_eq!(record.percent(Metric::Memory), Some(0.0));
    }
}
