//! Error handling for the sysvitals health engine.

use std::path::PathBuf;

use crate::metrics::data::Metric;

/// A specialized `Result` type for sysvitals operations.
pub type Result<T> = std::result::Result<T, HealthError>;

/// The main error type for sampling, evaluation and the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// The configured disk path does not exist or no mounted filesystem holds it
    #[error("Disk path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// The operating system declined to report a metric
    #[error("{metric} metric unavailable: {reason}")]
    MetricUnavailable { metric: Metric, reason: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// A blocking evaluation task panicked or was cancelled
    #[error("Evaluation task failed: {0}")]
    Task(String),
}

impl HealthError {
    /// Create a new path-not-found error
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Create a new metric-unavailable error
    pub fn metric_unavailable(metric: Metric, reason: impl Into<String>) -> Self {
        Self::MetricUnavailable {
            metric,
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new task error
    pub fn task_error(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }
}

impl From<tokio::task::JoinError> for HealthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task_error(err.to_string())
    }
}
