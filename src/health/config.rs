//! Threshold and evaluator configuration.

use crate::error::{HealthError, Result};
use crate::metrics::data::{Metric, BYTES_PER_MIB};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default CPU warning threshold in percent.
pub const DEFAULT_CPU_THRESHOLD: f64 = 50.0;
/// Default memory warning threshold in percent.
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 80.0;
/// Default disk warning threshold in percent.
pub const DEFAULT_DISK_THRESHOLD: f64 = 75.0;
/// Default network warning threshold in bytes (100 MiB).
pub const DEFAULT_NETWORK_THRESHOLD: u64 = 100 * BYTES_PER_MIB;
/// Default filesystem whose usage is sampled.
pub const DEFAULT_DISK_PATH: &str = "/";

/// Per-metric upper bounds. A reading strictly above its bound is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// CPU usage bound in percent
    pub cpu: f64,
    /// Memory usage bound in percent
    pub memory: f64,
    /// Disk usage bound in percent
    pub disk: f64,
    /// Cumulative network bound in bytes
    pub network: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_THRESHOLD,
            memory: DEFAULT_MEMORY_THRESHOLD,
            disk: DEFAULT_DISK_THRESHOLD,
            network: DEFAULT_NETWORK_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    /// Set the CPU bound.
    pub fn with_cpu(mut self, percent: f64) -> Self {
        self.cpu = percent;
        self
    }

    /// Set the memory bound.
    pub fn with_memory(mut self, percent: f64) -> Self {
        self.memory = percent;
        self
    }

    /// Set the disk bound.
    pub fn with_disk(mut self, percent: f64) -> Self {
        self.disk = percent;
        self
    }

    /// Set the network bound in bytes.
    pub fn with_network(mut self, bytes: u64) -> Self {
        self.network = bytes;
        self
    }

    /// Reject percentage bounds that are not finite or fall outside 0-100.
    pub fn validate(&self) -> Result<()> {
        for (metric, value) in [
            (Metric::Cpu, self.cpu),
            (Metric::Memory, self.memory),
            (Metric::Disk, self.disk),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(HealthError::config_error(format!(
                    "{} threshold must be between 0 and 100, got {}",
                    metric, value
                )));
            }
        }
        Ok(())
    }
}

/// Everything a [`HealthEvaluator`](super::HealthEvaluator) needs at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Per-metric bounds
    pub thresholds: ThresholdConfig,
    /// Path on the filesystem whose usage is sampled
    pub disk_path: PathBuf,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
        }
    }
}

impl EvaluatorConfig {
    /// Set the thresholds.
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the sampled disk path.
    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    /// Validate thresholds and make sure a disk path was given.
    pub fn validate(&self) -> Result<()> {
        if self.disk_path.as_os_str().is_empty() {
            return Err(HealthError::config_error("disk path must not be empty"));
        }
        self.thresholds.validate()
    }
}
