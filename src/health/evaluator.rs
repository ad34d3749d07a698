//! Threshold classification of host samples.

use crate::error::Result;
use crate::health::config::{EvaluatorConfig, ThresholdConfig};
use crate::metrics::{
    data::{HealthRecord, Metric},
    traits::MetricSampler,
    SystemSampler,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Log level a single reading is classified at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
}

/// Verdict for one metric of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatus {
    pub metric: Metric,
    pub level: Level,
    /// Sampled value (percent, or bytes for network)
    pub value: f64,
    /// Bound the value was compared against
    pub threshold: f64,
}

/// The four verdicts for one record, in [`Metric::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub statuses: [MetricStatus; 4],
}

impl Assessment {
    /// Verdict for a single metric.
    pub fn status(&self, metric: Metric) -> &MetricStatus {
        &self.statuses[metric.index()]
    }

    /// Level assigned to a single metric.
    pub fn level(&self, metric: Metric) -> Level {
        self.status(metric).level
    }

    /// Metrics that exceeded their bound.
    pub fn warnings(&self) -> impl Iterator<Item = &MetricStatus> {
        self.statuses
            .iter()
            .filter(|status| status.level == Level::Warning)
    }

    /// True when no metric exceeded its bound.
    pub fn is_healthy(&self) -> bool {
        self.warnings().next().is_none()
    }
}

fn level_for(exceeded: bool) -> Level {
    if exceeded {
        Level::Warning
    } else {
        Level::Info
    }
}

/// Classify every reading of `record`. A reading equal to its bound is `Info`.
pub fn classify(record: &HealthRecord, thresholds: &ThresholdConfig) -> Assessment {
    let percent = |metric, value: f64, threshold: f64| MetricStatus {
        metric,
        level: level_for(value > threshold),
        value,
        threshold,
    };

    Assessment {
        statuses: [
            percent(Metric::Cpu, record.cpu_percent, thresholds.cpu),
            percent(Metric::Memory, record.memory_percent, thresholds.memory),
            percent(Metric::Disk, record.disk_percent, thresholds.disk),
            MetricStatus {
                metric: Metric::Network,
                // Compare as integers; the f64 copies are for display only.
                level: level_for(record.network_bytes > thresholds.network),
                value: record.network_bytes as f64,
                threshold: thresholds.network as f64,
            },
        ],
    }
}

/// Emit one log event per metric of `assessment`.
fn log_assessment(record: &HealthRecord, assessment: &Assessment) {
    for status in &assessment.statuses {
        let metric = status.metric.as_str();
        let value = status.value;
        let threshold = status.threshold;
        match (status.metric, status.level) {
            (Metric::Cpu, Level::Warning) => {
                warn!(metric, value, threshold, "High CPU usage detected: {:.1}%", value)
            }
            (Metric::Cpu, Level::Info) => {
                info!(metric, value, threshold, "CPU usage detected: {:.1}%", value)
            }
            (Metric::Memory, Level::Warning) => {
                warn!(metric, value, threshold, "High memory usage detected: {:.1}%", value)
            }
            (Metric::Memory, Level::Info) => {
                info!(metric, value, threshold, "Memory usage detected: {:.1}%", value)
            }
            (Metric::Disk, Level::Warning) => {
                warn!(metric, value, threshold, "Low disk space detected: {:.1}% used", value)
            }
            (Metric::Disk, Level::Info) => {
                info!(metric, value, threshold, "Disk space detected: {:.1}% used", value)
            }
            (Metric::Network, Level::Warning) => warn!(
                metric,
                value = record.network_bytes,
                threshold,
                "High network traffic detected: {} bytes ({:.2} MiB)",
                record.network_bytes,
                record.network_mib()
            ),
            (Metric::Network, Level::Info) => info!(
                metric,
                value = record.network_bytes,
                threshold,
                "Network traffic detected: {} bytes ({:.2} MiB)",
                record.network_bytes,
                record.network_mib()
            ),
        }
    }
}

/// Samples the host through a [`MetricSampler`] and classifies the readings.
///
/// The evaluator keeps no history. It may be shared behind an `Arc` and
/// called from several threads at once; each call reads its own samples.
#[derive(Debug)]
pub struct HealthEvaluator<S = SystemSampler> {
    sampler: S,
    config: EvaluatorConfig,
}

impl HealthEvaluator<SystemSampler> {
    /// Evaluator backed by the local host.
    pub fn system(config: EvaluatorConfig) -> Result<Self> {
        Self::new(SystemSampler::new(), config)
    }
}

impl<S: MetricSampler> HealthEvaluator<S> {
    /// Create an evaluator, validating `config`.
    pub fn new(sampler: S, config: EvaluatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { sampler, config })
    }

    /// Thresholds supplied at construction.
    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.config.thresholds
    }

    /// Path whose filesystem usage is sampled.
    pub fn disk_path(&self) -> &Path {
        &self.config.disk_path
    }

    /// The underlying sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Sample each metric once, log one event per metric and return the record.
    ///
    /// Blocks for the sampler's CPU window. Any sampling failure aborts the
    /// whole cycle before anything is logged.
    pub fn evaluate(&self, thresholds: &ThresholdConfig) -> Result<HealthRecord> {
        let cpu_percent = self.sampler.sample_cpu()?;
        let memory_percent = self.sampler.sample_memory()?;
        let disk_percent = self.sampler.sample_disk(&self.config.disk_path)?;
        let network_bytes = self.sampler.sample_network()?;

        let record = HealthRecord::new(cpu_percent, memory_percent, disk_percent, network_bytes);
        log_assessment(&record, &classify(&record, thresholds));
        Ok(record)
    }

    /// [`evaluate`](Self::evaluate) against the configured thresholds.
    pub fn run_checks(&self) -> Result<HealthRecord> {
        self.evaluate(&self.config.thresholds)
    }

    /// Run the configured checks and return the verdicts alongside the record.
    pub fn assess(&self) -> Result<(HealthRecord, Assessment)> {
        let record = self.run_checks()?;
        Ok((record, classify(&record, &self.config.thresholds)))
    }
}
