//! A sampler that reports preset readings.
//!
//! Drives the evaluator deterministically in tests and benchmarks, where
//! readings from the real host would make outcomes unpredictable.

use crate::error::{HealthError, Result};
use crate::metrics::{data::Metric, traits::MetricSampler};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the same configured readings on every call and counts the calls.
#[derive(Debug, Default)]
pub struct FixedSampler {
    cpu: f64,
    memory: f64,
    disk: Option<f64>,
    network: u64,
    unavailable: Option<Metric>,
    calls: [AtomicUsize; 4],
}

impl FixedSampler {
    /// Create a sampler reporting the given readings.
    pub fn new(cpu: f64, memory: f64, disk: f64, network: u64) -> Self {
        Self {
            cpu,
            memory,
            disk: Some(disk),
            network,
            ..Default::default()
        }
    }

    /// Make every disk read fail as if the path did not exist.
    pub fn without_disk(mut self) -> Self {
        self.disk = None;
        self
    }

    /// Make reads of `metric` fail with `MetricUnavailable`.
    pub fn with_unavailable(mut self, metric: Metric) -> Self {
        self.unavailable = Some(metric);
        self
    }

    /// Number of reads made for `metric` so far.
    pub fn calls(&self, metric: Metric) -> usize {
        self.calls[metric.index()].load(Ordering::SeqCst)
    }

    fn record_call(&self, metric: Metric) -> Result<()> {
        self.calls[metric.index()].fetch_add(1, Ordering::SeqCst);
        if self.unavailable == Some(metric) {
            return Err(HealthError::metric_unavailable(metric, "disabled on this sampler"));
        }
        Ok(())
    }
}

impl MetricSampler for FixedSampler {
    fn sample_cpu(&self) -> Result<f64> {
        self.record_call(Metric::Cpu)?;
        Ok(self.cpu)
    }

    fn sample_memory(&self) -> Result<f64> {
        self.record_call(Metric::Memory)?;
        Ok(self.memory)
    }

    fn sample_disk(&self, path: &Path) -> Result<f64> {
        self.record_call(Metric::Disk)?;
        self.disk.ok_or_else(|| HealthError::path_not_found(path))
    }

    fn sample_network(&self) -> Result<u64> {
        self.record_call(Metric::Network)?;
        Ok(self.network)
    }
}
