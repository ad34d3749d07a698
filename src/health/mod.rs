//! Threshold evaluation of host samples and the loop that schedules it.
//!
//! [`HealthEvaluator`] turns one round of samples into a [`HealthRecord`]
//! and logs a warning or info event per metric. [`Scheduler`] repeats that at a
//! fixed cadence for long-running consumers such as the dashboard.
//!
//! [`HealthRecord`]: crate::metrics::HealthRecord

pub mod config;
pub mod evaluator;
pub mod scheduler;

// Re-export commonly used items
pub use config::{EvaluatorConfig, ThresholdConfig};
pub use evaluator::{classify, Assessment, HealthEvaluator, Level, MetricStatus};
pub use scheduler::{evaluate_blocking, CycleStats, Scheduler};
