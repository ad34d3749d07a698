//! Plotly-compatible figure descriptions for the dashboard.
//!
//! Figures serialize to the `{ "data": [...], "layout": {...} }` shape that
//! `Plotly.react` accepts, so the page can render them without reshaping.

use crate::health::config::ThresholdConfig;
use crate::metrics::data::{HealthRecord, BYTES_PER_MIB};
use serde::Serialize;

/// Upper end of the gauge axis.
pub const GAUGE_MAX: f64 = 100.0;

/// A chart: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Figure layout. Only the title is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hole: Option<f64>,
    },
    Indicator {
        value: f64,
        title: Title,
        mode: String,
        gauge: Gauge,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub axis: Axis,
    pub steps: Vec<Step>,
    pub threshold: GaugeThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub range: [f64; 2],
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeThreshold {
    pub line: Line,
    pub thickness: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
    pub width: u32,
}

/// Pie chart of `values` labelled by `labels`.
pub fn pie_chart(labels: &[&str], values: &[f64], title: &str) -> Figure {
    Figure {
        data: vec![Trace::Pie {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            values: values.to_vec(),
            hole: None,
        }],
        layout: Layout {
            title: Some(title.to_string()),
        },
    }
}

/// Gauge on a fixed 0-100 axis with a red marker at `marker`.
pub fn gauge_chart(value: f64, title: &str, marker: f64) -> Figure {
    Figure {
        data: vec![Trace::Indicator {
            value,
            title: Title {
                text: title.to_string(),
            },
            mode: "gauge+number".to_string(),
            gauge: Gauge {
                axis: Axis {
                    range: [0.0, GAUGE_MAX],
                },
                steps: vec![Step {
                    range: [0.0, GAUGE_MAX],
                    color: "lightgray".to_string(),
                }],
                threshold: GaugeThreshold {
                    line: Line {
                        color: "red".to_string(),
                        width: 4,
                    },
                    thickness: 0.75,
                    value: marker,
                },
            },
        }],
        layout: Layout::default(),
    }
}

/// Used-vs-unused split of a percentage reading.
pub fn usage_pie(percent: f64, title: &str) -> Figure {
    let used = percent.clamp(0.0, 100.0);
    pie_chart(&["Used", "Unused"], &[used, 100.0 - used], title)
}

/// One donut chart holding all four readings, network in MiB.
pub fn summary_pie(record: &HealthRecord) -> Figure {
    let mut figure = pie_chart(
        &["cpu_usage", "memory_usage", "disk_space", "network_traffic"],
        &[
            record.cpu_percent,
            record.memory_percent,
            record.disk_percent,
            record.network_mib(),
        ],
        "Health Check Data",
    );
    if let Some(Trace::Pie { hole, .. }) = figure.data.first_mut() {
        *hole = Some(0.3);
    }
    figure
}

/// The four dashboard charts for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFigures {
    pub cpu: Figure,
    pub memory: Figure,
    pub disk: Figure,
    pub network: Figure,
}

impl DashboardFigures {
    /// Build all charts from a single record.
    ///
    /// The network gauge shows the cumulative counter in MiB with the marker
    /// at the configured network threshold.
    pub fn from_record(record: &HealthRecord, thresholds: &ThresholdConfig) -> Self {
        Self {
            cpu: usage_pie(record.cpu_percent, "CPU Usage"),
            memory: usage_pie(record.memory_percent, "Memory Usage"),
            disk: usage_pie(record.disk_percent, "Disk Space"),
            network: gauge_chart(
                record.network_mib(),
                "Network Traffic (MiB since boot)",
                thresholds.network as f64 / BYTES_PER_MIB as f64,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_pie_splits_percent() {
        let figure = usage_pie(37.5, "CPU Usage");
        let value = serde_json::to_value(&figure).unwrap();
        assert_eq!(value["data"][0]["type"], "pie");
        assert_eq!(value["data"][0]["labels"], json!(["Used", "Unused"]));
        assert_eq!(value["data"][0]["values"], json!([37.5, 62.5]));
        assert_eq!(value["layout"]["title"], "CPU Usage");
        assert!(value["data"][0].get("hole").is_none());
    }

    #[test]
    fn test_gauge_shape() {
        let figure = gauge_chart(42.0, "Network Traffic", 100.0);
        let value = serde_json::to_value(&figure).unwrap();
        let trace = &value["data"][0];
        assert_eq!(trace["type"], "indicator");
        assert_eq!(trace["mode"], "gauge+number");
        assert_eq!(trace["gauge"]["axis"]["range"], json!([0.0, 100.0]));
        assert_eq!(trace["gauge"]["threshold"]["line"]["color"], "red");
        assert_eq!(trace["gauge"]["threshold"]["value"], 100.0);
        assert_eq!(value["layout"], json!({}));
    }

    #[test]
    fn test_dashboard_network_marker_follows_threshold() {
        let record = HealthRecord::new(10.0, 20.0, 30.0, 50 * BYTES_PER_MIB);
        let figures = DashboardFigures::from_record(&record, &ThresholdConfig::default());
        match &figures.network.data[0] {
            Trace::Indicator { value, gauge, .. } => {
                assert_eq!(*value, 50.0);
                assert_eq!(gauge.threshold.value, 100.0);
            }
            other => panic!("unexpected trace {:?}", other),
        }
    }

    #[test]
    fn test_summary_pie_is_donut() {
        let record = HealthRecord::new(10.0, 20.0, 30.0, BYTES_PER_MIB);
        let value = serde_json::to_value(summary_pie(&record)).unwrap();
        assert_eq!(value["data"][0]["hole"], 0.3);
        assert_eq!(value["data"][0]["values"], json!([10.0, 20.0, 30.0, 1.0]));
    }
}
