//! # sysvitals - Host Health Checks
//!
//! Periodically samples CPU, memory, disk and network usage, classifies each
//! reading against a threshold and reports the result through structured
//! logging, a background loop or a live web dashboard.
//!
//! ## Features
//!
//! - **Sampling**: instantaneous readings through [`SystemSampler`] (sysinfo)
//! - **Evaluation**: strict threshold classification with one log event per metric
//! - **Scheduling**: fixed-cadence loop that sleeps between ticks
//! - **Web dashboard**: live charts over WebSocket plus a small REST API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sysvitals::{EvaluatorConfig, HealthEvaluator, ThresholdConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let evaluator = HealthEvaluator::system(EvaluatorConfig::default())?;
//!     let record = evaluator.evaluate(&ThresholdConfig::default())?;
//!     println!("CPU at {:.1}%", record.cpu_percent);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod health;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{HealthError, Result};
pub use health::{
    classify, Assessment, CycleStats, EvaluatorConfig, HealthEvaluator, Level, MetricStatus,
    Scheduler, ThresholdConfig,
};
pub use metrics::{
    data::{HealthRecord, Metric},
    FixedSampler, MetricSampler, SystemSampler,
};
pub use web::{start_web_server, WebConfig};

/// The default dashboard refresh interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

/// The default interval of the headless `watch` loop in milliseconds
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 1000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8050;

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
