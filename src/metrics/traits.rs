//! Traits for host metric sampling.

use crate::error::Result;
use std::path::Path;

/// Source of instantaneous host readings.
///
/// Each method performs one independent read. Implementations hold no state
/// that one call can leave behind for the next, so a single sampler may be
/// shared across threads and called concurrently.
pub trait MetricSampler: Send + Sync {
    /// CPU utilization percentage measured over a fixed observation window.
    ///
    /// Blocks the calling thread for the length of the window.
    fn sample_cpu(&self) -> Result<f64>;

    /// Percentage of physical memory in use.
    fn sample_memory(&self) -> Result<f64>;

    /// Percentage of space in use on the filesystem holding `path`.
    fn sample_disk(&self, path: &Path) -> Result<f64>;

    /// Cumulative bytes received plus sent across all interfaces.
    fn sample_network(&self) -> Result<u64>;
}

impl<S: MetricSampler + ?Sized> MetricSampler for std::sync::Arc<S> {
    fn sample_cpu(&self) -> Result<f64> {
        (**self).sample_cpu()
    }

    fn sample_memory(&self) -> Result<f64> {
        (**self).sample_memory()
    }

    fn sample_disk(&self, path: &Path) -> Result<f64> {
        (**self).sample_disk(path)
    }

    fn sample_network(&self) -> Result<u64> {
        (**self).sample_network()
    }
}
