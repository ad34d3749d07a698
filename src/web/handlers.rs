//! HTTP handlers for API endpoints.

use crate::error::HealthError;
use crate::health::{classify, evaluate_blocking};
use crate::metrics::traits::MetricSampler;
use crate::web::charts::{summary_pie, DashboardFigures, Figure};
use crate::web::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

impl IntoResponse for HealthError {
    fn into_response(self) -> Response {
        let status = match &self {
            HealthError::PathNotFound { .. } | HealthError::MetricUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            HealthError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run one evaluation and return the record with its classification.
pub async fn get_health<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<serde_json::Value>, HealthError>
where
    S: MetricSampler + 'static,
{
    let record = evaluate_blocking(state.evaluator.clone()).await?;
    let assessment = classify(&record, state.evaluator.thresholds());

    Ok(Json(json!({
        "sampled_at": chrono::Utc::now().to_rfc3339(),
        "record": record,
        "assessment": assessment,
        "healthy": assessment.is_healthy(),
    })))
}

/// Run one evaluation and return the dashboard charts for it.
pub async fn get_figures<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<DashboardFigures>, HealthError>
where
    S: MetricSampler + 'static,
{
    let record = evaluate_blocking(state.evaluator.clone()).await?;
    Ok(Json(DashboardFigures::from_record(
        &record,
        state.evaluator.thresholds(),
    )))
}

/// Run one evaluation and return all four readings as a single donut chart.
pub async fn get_summary<S>(State(state): State<AppState<S>>) -> Result<Json<Figure>, HealthError>
where
    S: MetricSampler + 'static,
{
    let record = evaluate_blocking(state.evaluator.clone()).await?;
    Ok(Json(summary_pie(&record)))
}

/// Service liveness endpoint. Does not sample the host.
pub async fn service_status<S>(State(state): State<AppState<S>>) -> Json<serde_json::Value>
where
    S: MetricSampler + 'static,
{
    Json(json!({
        "status": "ok",
        "service": "sysvitals",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "thresholds": state.evaluator.thresholds(),
        "disk_path": state.evaluator.disk_path().display().to_string(),
        "websocket_clients": state.hub.connected_clients().await,
    }))
}

/// Serve the dashboard page from the configured static directory.
pub async fn serve_index<S>(State(state): State<AppState<S>>) -> Result<Html<String>, HealthError>
where
    S: MetricSampler + 'static,
{
    let Some(static_path) = state.config.static_path.as_deref() else {
        return Ok(Html(DEFAULT_INDEX_HTML.to_string()));
    };

    let index = std::path::Path::new(static_path).join("index.html");
    let content = tokio::fs::read_to_string(&index).await?;
    Ok(Html(content))
}

/// Serve the built-in dashboard page.
pub async fn default_index() -> Html<&'static str> {
    Html(DEFAULT_INDEX_HTML)
}

/// Built-in dashboard: four charts redrawn on every WebSocket update.
pub const DEFAULT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>sysvitals - System Health</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f5f7;
            margin: 0;
            padding: 20px;
        }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(380px, 1fr));
            gap: 16px;
        }
        .chart {
            background: white;
            border-radius: 8px;
            min-height: 360px;
        }
        .warning {
            outline: 3px solid #e5534b;
        }
        #status {
            margin-top: 16px;
            color: #555;
        }
    </style>
</head>
<body>
    <div class="grid">
        <div class="chart" id="cpu-chart"></div>
        <div class="chart" id="memory-chart"></div>
        <div class="chart" id="disk-chart"></div>
        <div class="chart" id="network-chart"></div>
    </div>
    <div id="status">Connecting...</div>
    <script>
        const charts = ['cpu', 'memory', 'disk', 'network'];

        function render(update) {
            charts.forEach(name => {
                const figure = update.figures[name];
                const el = document.getElementById(`${name}-chart`);
                Plotly.react(el, figure.data, figure.layout);
            });
            update.assessment.statuses.forEach(status => {
                const el = document.getElementById(`${status.metric}-chart`);
                el.classList.toggle('warning', status.level === 'warning');
            });
            document.getElementById('status').textContent =
                `Last sample: ${new Date(update.sampled_at).toLocaleTimeString()}`;
        }

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            const ws = new WebSocket(`${protocol}//${window.location.host}/ws`);
            ws.onmessage = event => render(JSON.parse(event.data));
            ws.onclose = () => {
                document.getElementById('status').textContent = 'Disconnected, retrying...';
                setTimeout(connect, 2000);
            };
        }

        connect();
    </script>
</body>
</html>
"#;
