use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::Disks;
use sysvitals::{
    health::evaluate_blocking,
    web::{create_app, AppState},
    EvaluatorConfig, FixedSampler, HealthError, HealthEvaluator, MetricSampler, Scheduler,
    SystemSampler, WebConfig,
};
use tower::ServiceExt;

fn fixed_app(sampler: FixedSampler) -> axum::Router {
    let evaluator = Arc::new(
        HealthEvaluator::new(sampler, EvaluatorConfig::default()).expect("valid config"),
    );
    create_app(AppState::new(evaluator, WebConfig::default())).expect("Should build app")
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("Should handle request");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, body.to_vec())
}

/// Mount point of a filesystem sysinfo can see, for tests against the real host.
fn listed_mount_point() -> Option<std::path::PathBuf> {
    Disks::new_with_refreshed_list()
        .iter()
        .find(|disk| disk.total_space() > 0)
        .map(|disk| disk.mount_point().to_path_buf())
}

#[tokio::test]
async fn test_system_evaluation_in_range() {
    let Some(mount_point) = listed_mount_point() else {
        return;
    };

    let evaluator = Arc::new(
        HealthEvaluator::system(EvaluatorConfig::default().with_disk_path(mount_point))
            .expect("valid config"),
    );
    let record = evaluate_blocking(evaluator)
        .await
        .expect("Should evaluate host health");

    for percent in [record.cpu_percent, record.memory_percent, record.disk_percent] {
        assert!((0.0..=100.0).contains(&percent), "out of range: {}", percent);
    }
}

#[tokio::test]
async fn test_system_evaluation_missing_path() {
    let evaluator = Arc::new(
        HealthEvaluator::system(
            EvaluatorConfig::default().with_disk_path("/no/such/directory/for/sysvitals"),
        )
        .expect("valid config"),
    );

    let result = evaluate_blocking(evaluator).await;
    assert!(matches!(result, Err(HealthError::PathNotFound { .. })));
}

#[test]
fn test_disk_path_inside_mount() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let sampler = SystemSampler::new();

    // A directory below a mount point resolves to the filesystem holding it.
    let percent = sampler.sample_disk(dir.path()).expect("Should sample temp dir");
    assert!((0.0..=100.0).contains(&percent), "out of range: {}", percent);
}

/// Disk usage agrees with `df`, which leaves root-reserved blocks out.
#[cfg(unix)]
#[test]
fn test_disk_percent_matches_df() {
    let Ok(output) = std::process::Command::new("df").args(["-P", "-k", "/"]).output() else {
        return;
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(row) = stdout.lines().nth(1) else {
        return;
    };
    let columns: Vec<&str> = row.split_whitespace().collect();
    let (Some(used), Some(available)) = (
        columns.get(2).and_then(|v| v.parse::<f64>().ok()),
        columns.get(3).and_then(|v| v.parse::<f64>().ok()),
    ) else {
        return;
    };
    if used + available == 0.0 {
        return;
    }

    let expected = used / (used + available) * 100.0;
    let sampled = SystemSampler::new()
        .sample_disk(std::path::Path::new("/"))
        .expect("Should sample root filesystem");
    assert!(
        (sampled - expected).abs() < 1.0,
        "df reports {:.2}%, sampled {:.2}%",
        expected,
        sampled
    );
}

#[test]
fn test_network_counter_monotonic() {
    let sampler = SystemSampler::new();
    let mut previous = sampler.sample_network().expect("Should read counters");
    for _ in 0..3 {
        std::thread::sleep(Duration::from_millis(20));
        let current = sampler.sample_network().expect("Should read counters");
        assert!(current >= previous, "{} then {}", previous, current);
        previous = current;
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = fixed_app(FixedSampler::new(50.0, 85.0, 75.0, 50_000_000));
    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert_eq!(json["record"]["cpu_percent"], 50.0);
    assert_eq!(json["record"]["network_bytes"], 50_000_000u64);
    assert_eq!(json["assessment"]["statuses"][1]["level"], "warning");
    assert_eq!(json["healthy"], false);
}

#[tokio::test]
async fn test_health_endpoint_reports_sampling_failure() {
    let app = fixed_app(FixedSampler::new(1.0, 1.0, 1.0, 1).without_disk());
    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert!(json["error"].as_str().unwrap().contains("Disk path not found"));
    assert!(json.get("record").is_none());
}

#[tokio::test]
async fn test_figures_endpoint() {
    let app = fixed_app(FixedSampler::new(25.0, 50.0, 75.0, 0));
    let (status, body) = get(app, "/api/figures").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert_eq!(json["cpu"]["data"][0]["values"], serde_json::json!([25.0, 75.0]));
    assert_eq!(json["disk"]["layout"]["title"], "Disk Space");
    assert_eq!(json["network"]["data"][0]["type"], "indicator");
}

#[tokio::test]
async fn test_summary_endpoint() {
    let app = fixed_app(FixedSampler::new(10.0, 20.0, 30.0, 2 * 1024 * 1024));
    let (status, body) = get(app, "/api/summary").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert_eq!(json["data"][0]["type"], "pie");
    assert_eq!(json["data"][0]["hole"], 0.3);
    assert_eq!(json["data"][0]["values"], serde_json::json!([10.0, 20.0, 30.0, 2.0]));
    assert_eq!(json["layout"]["title"], "Health Check Data");
}

#[tokio::test]
async fn test_status_endpoint_does_not_sample() {
    let sampler = FixedSampler::new(1.0, 1.0, 1.0, 1);
    let evaluator = Arc::new(HealthEvaluator::new(sampler, EvaluatorConfig::default()).unwrap());
    let app = create_app(AppState::new(Arc::clone(&evaluator), WebConfig::default())).unwrap();

    let (status, body) = get(app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["thresholds"]["memory"], 80.0);
    assert_eq!(evaluator.sampler().calls(sysvitals::Metric::Cpu), 0);
}

#[tokio::test]
async fn test_default_index_served() {
    let app = fixed_app(FixedSampler::default());
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let html = String::from_utf8(body).expect("Should be UTF-8");
    for id in ["cpu-chart", "memory-chart", "disk-chart", "network-chart"] {
        assert!(html.contains(id), "missing {}", id);
    }
}

#[tokio::test]
async fn test_custom_static_index_served() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    std::fs::write(dir.path().join("index.html"), "<h1>custom</h1>").unwrap();

    let evaluator = Arc::new(
        HealthEvaluator::new(FixedSampler::default(), EvaluatorConfig::default()).unwrap(),
    );
    let config = WebConfig::default()
        .with_static_path(Some(dir.path().to_string_lossy().to_string()));
    let app = create_app(AppState::new(evaluator, config)).unwrap();

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>custom</h1>");
}

#[tokio::test]
async fn test_custom_index_removed_after_startup() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let index = dir.path().join("index.html");
    std::fs::write(&index, "<h1>custom</h1>").unwrap();

    let evaluator = Arc::new(
        HealthEvaluator::new(FixedSampler::default(), EvaluatorConfig::default()).unwrap(),
    );
    let config = WebConfig::default()
        .with_static_path(Some(dir.path().to_string_lossy().to_string()));
    let app = create_app(AppState::new(evaluator, config)).unwrap();
    std::fs::remove_file(&index).unwrap();

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: Value = serde_json::from_slice(&body).expect("Should be JSON");
    assert!(json["error"].as_str().unwrap().starts_with("I/O error"));
}

#[tokio::test]
async fn test_scheduler_drives_host_sampler() {
    let Some(mount_point) = listed_mount_point() else {
        return;
    };

    let evaluator = Arc::new(
        HealthEvaluator::system(EvaluatorConfig::default().with_disk_path(mount_point)).unwrap(),
    );
    let scheduler = Scheduler::new(evaluator, Duration::from_millis(100))
        .unwrap()
        .with_max_cycles(2);

    let mut records = Vec::new();
    let stats = scheduler
        .run(std::future::pending(), |record| records.push(*record))
        .await;

    assert_eq!(stats.succeeded, 2);
    assert!(records[1].network_bytes >= records[0].network_bytes);
}
