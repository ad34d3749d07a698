//! sysvitals - host health checks binary
//!
//! Runs the health engine as a live dashboard, a headless logging loop or a
//! one-shot snapshot.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sysvitals::{
    classify, health::config, metrics::data::BYTES_PER_MIB, start_web_server, EvaluatorConfig,
    HealthEvaluator, HealthRecord, Level, Metric, MetricStatus, Scheduler, ThresholdConfig,
    WebConfig, DEFAULT_INTERVAL_MS, DEFAULT_WATCH_INTERVAL_MS, DEFAULT_WEB_PORT,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sysvitals")]
#[command(about = "Host health checks with threshold warnings and a live dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples CPU, memory, disk and network usage, logs a warning for every \
reading above its threshold and optionally serves a live dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    checks: CheckArgs,

    /// Milliseconds between evaluations (default: 5000 for serve, 1000 for watch)
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// CPU warning threshold in percent
    #[arg(long, global = true, default_value_t = config::DEFAULT_CPU_THRESHOLD)]
    cpu_threshold: f64,

    /// Memory warning threshold in percent
    #[arg(long, global = true, default_value_t = config::DEFAULT_MEMORY_THRESHOLD)]
    memory_threshold: f64,

    /// Disk warning threshold in percent
    #[arg(long, global = true, default_value_t = config::DEFAULT_DISK_THRESHOLD)]
    disk_threshold: f64,

    /// Network warning threshold in cumulative bytes
    #[arg(long, global = true, default_value_t = config::DEFAULT_NETWORK_THRESHOLD)]
    network_threshold: u64,

    /// Path whose filesystem usage is checked
    #[arg(long, global = true, default_value = config::DEFAULT_DISK_PATH)]
    disk_path: PathBuf,
}

impl CheckArgs {
    fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig::default()
            .with_thresholds(
                ThresholdConfig::default()
                    .with_cpu(self.cpu_threshold)
                    .with_memory(self.memory_threshold)
                    .with_disk(self.disk_threshold)
                    .with_network(self.network_threshold),
            )
            .with_disk_path(&self.disk_path)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard (default)
    Serve(ServeArgs),

    /// Run health checks in a loop and log the results
    Watch(WatchArgs),

    /// Run the health checks once and print the record
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Static files directory (optional)
    #[arg(long)]
    static_dir: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_WEB_PORT,
            static_dir: None,
            no_cors: false,
            max_connections: 100,
        }
    }
}

#[derive(Args)]
struct WatchArgs {
    /// Stop after this many cycles instead of running until Ctrl-C
    #[arg(long)]
    cycles: Option<u64>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let evaluator = Arc::new(
        HealthEvaluator::system(cli.checks.evaluator_config())
            .context("invalid health check configuration")?,
    );

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args, evaluator).await?,
        Some(Commands::Watch(args)) => watch_command(&cli, args, evaluator).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(args, evaluator).await?,
        None => serve_command(&cli, &ServeArgs::default(), evaluator).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    // The watch loop exists to emit per-metric events, so it logs at info by default.
    let level = if cli.debug {
        "debug"
    } else if cli.verbose || matches!(cli.command, Some(Commands::Watch(_))) {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

async fn serve_command(
    cli: &Cli,
    args: &ServeArgs,
    evaluator: Arc<HealthEvaluator>,
) -> anyhow::Result<()> {
    let interval = cli.interval.unwrap_or(DEFAULT_INTERVAL_MS);

    let mut web_config = WebConfig::new(&args.host, args.port)
        .with_cors(!args.no_cors)
        .with_max_websocket_connections(args.max_connections)
        .with_interval_ms(interval);

    if let Some(static_dir) = &args.static_dir {
        web_config = web_config.with_static_path(Some(static_dir.clone()));
        info!("Using static files from: {}", static_dir);
    }

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - CORS enabled: {}", web_config.enable_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);
    info!("  - Evaluation interval: {}ms", interval);
    info!("  - Disk path: {}", evaluator.disk_path().display());

    println!("Dashboard: http://{}/", web_config.bind_address());
    start_web_server(web_config, evaluator).await?;

    Ok(())
}

async fn watch_command(
    cli: &Cli,
    args: &WatchArgs,
    evaluator: Arc<HealthEvaluator>,
) -> anyhow::Result<()> {
    let interval = Duration::from_millis(cli.interval.unwrap_or(DEFAULT_WATCH_INTERVAL_MS));

    let mut scheduler = Scheduler::new(evaluator, interval)?;
    if let Some(cycles) = args.cycles {
        scheduler = scheduler.with_max_cycles(cycles);
    }

    info!("Snooping on the system...");
    let stats = scheduler
        .run(sysvitals::shutdown_signal(), |record| {
            debug!(?record, "Health check cycle finished");
        })
        .await;

    if stats.total() > 0 && stats.succeeded == 0 {
        bail!("all {} health check cycles failed", stats.failed);
    }

    Ok(())
}

async fn snapshot_command(
    args: &SnapshotArgs,
    evaluator: Arc<HealthEvaluator>,
) -> anyhow::Result<()> {
    let record = sysvitals::health::evaluate_blocking(Arc::clone(&evaluator)).await?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&record)?;
            println!("{}", json);
        }
        "pretty" => {
            print_pretty_record(&record, evaluator.thresholds());
        }
        other => bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_record(record: &HealthRecord, thresholds: &ThresholdConfig) {
    println!(
        "System Health ({})",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");

    let assessment = classify(record, thresholds);
    for status in &assessment.statuses {
        println!("{}", status_line(record, status));
    }
}

fn status_line(record: &HealthRecord, status: &MetricStatus) -> String {
    let marker = match status.level {
        Level::Warning => "WARN",
        Level::Info => "ok",
    };
    match status.metric {
        Metric::Network => format!(
            "  {:<8} {:>10.2} MiB  (threshold {:.2} MiB, cumulative)  {}",
            status.metric,
            record.network_mib(),
            status.threshold / BYTES_PER_MIB as f64,
            marker
        ),
        _ => format!(
            "  {:<8} {:>10.1} %    (threshold {:.1} %)  {}",
            status.metric, status.value, status.threshold, marker
        ),
    }
}
