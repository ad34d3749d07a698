//! Web dashboard for live health records.
//!
//! Serves a page of four charts fed over a WebSocket, plus REST endpoints for
//! one-off evaluations. The server owns one [`Scheduler`] whose records are
//! fanned out to every connected client, so a tick costs a single evaluation
//! no matter how many charts or clients are watching.

pub mod charts;
pub mod config;
pub mod handlers;
pub mod router;
pub mod websocket;

// Re-export commonly used items
pub use charts::DashboardFigures;
pub use config::WebConfig;
pub use router::create_app;
pub use websocket::{DashboardUpdate, Hub};

use crate::error::{HealthError, Result};
use crate::health::{classify, HealthEvaluator, Scheduler, ThresholdConfig};
use crate::metrics::{data::HealthRecord, traits::MetricSampler};
use futures_util::stream::BoxStream;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{error, info};

/// Shared state handed to every handler.
pub struct AppState<S> {
    pub evaluator: Arc<HealthEvaluator<S>>,
    pub hub: Hub,
    pub config: Arc<WebConfig>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            evaluator: Arc::clone(&self.evaluator),
            hub: self.hub.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: MetricSampler + 'static> AppState<S> {
    /// Build state for `evaluator` under `config`.
    pub fn new(evaluator: Arc<HealthEvaluator<S>>, config: WebConfig) -> Self {
        Self {
            evaluator,
            hub: Hub::new(config.max_websocket_connections),
            config: Arc::new(config),
        }
    }
}

/// Turn each scheduled record into a [`DashboardUpdate`] and broadcast it.
/// Failed cycles are logged and skipped.
pub async fn publish_updates(
    mut records: BoxStream<'static, Result<HealthRecord>>,
    hub: Hub,
    thresholds: ThresholdConfig,
) {
    while let Some(outcome) = records.next().await {
        let record = match outcome {
            Ok(record) => record,
            Err(e) => {
                error!("Health check cycle failed: {}", e);
                continue;
            }
        };

        let update = DashboardUpdate {
            sampled_at: chrono::Utc::now(),
            record,
            assessment: classify(&record, &thresholds),
            figures: DashboardFigures::from_record(&record, &thresholds),
        };
        if let Err(e) = hub.broadcast(update) {
            error!("Failed to broadcast update: {}", e);
        }
    }
}

/// Start the dashboard and its evaluation loop; returns after Ctrl-C.
pub async fn start_web_server<S>(config: WebConfig, evaluator: Arc<HealthEvaluator<S>>) -> Result<()>
where
    S: MetricSampler + 'static,
{
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| HealthError::config_error(format!("Invalid bind address: {}", e)))?;

    let scheduler = Scheduler::new(Arc::clone(&evaluator), config.interval())?;
    let thresholds = *evaluator.thresholds();
    let state = AppState::new(evaluator, config);
    let app = create_app(state.clone())?;

    info!("Starting sysvitals dashboard on http://{}", addr);
    info!("API endpoint: http://{}/api/health", addr);
    info!("Summary endpoint: http://{}/api/summary", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HealthError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    let publisher = tokio::spawn(publish_updates(
        scheduler.into_stream(),
        state.hub.clone(),
        thresholds,
    ));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(crate::shutdown_signal())
        .await
        .map_err(|e| HealthError::web_server_error(format!("Server error: {}", e)));

    publisher.abort();
    served
}
