//! Fixed-cadence evaluation loop.

use crate::error::{HealthError, Result};
use crate::health::evaluator::HealthEvaluator;
use crate::metrics::{data::HealthRecord, traits::MetricSampler};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

/// Run one evaluation on the blocking pool so the CPU window never stalls
/// the async runtime.
pub async fn evaluate_blocking<S>(evaluator: Arc<HealthEvaluator<S>>) -> Result<HealthRecord>
where
    S: MetricSampler + 'static,
{
    tokio::task::spawn_blocking(move || evaluator.run_checks()).await?
}

/// Outcome counts of a finished [`Scheduler::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub succeeded: u64,
    pub failed: u64,
}

impl CycleStats {
    /// Total cycles attempted.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Invokes a [`HealthEvaluator`] once per tick.
///
/// Ticks come from `tokio::time::interval`, which sleeps until each deadline.
/// When an evaluation outlasts the period the next tick is pushed back rather
/// than fired in a burst, so cycles never overlap.
pub struct Scheduler<S> {
    evaluator: Arc<HealthEvaluator<S>>,
    period: Duration,
    max_cycles: Option<u64>,
}

impl<S: MetricSampler + 'static> Scheduler<S> {
    /// Create a scheduler ticking every `period`.
    pub fn new(evaluator: Arc<HealthEvaluator<S>>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(HealthError::config_error("evaluation interval must be non-zero"));
        }
        Ok(Self {
            evaluator,
            period,
            max_cycles: None,
        })
    }

    /// Stop [`run`](Self::run) after `cycles` attempts.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Endless stream with one item per cycle. Failed cycles are yielded as
    /// errors and the stream keeps going.
    pub fn into_stream(self) -> BoxStream<'static, Result<HealthRecord>> {
        let period = self.period;

        // The interval is built on first poll so it binds to the runtime
        // that drives the stream.
        let stream = stream::unfold(
            (self.evaluator, None),
            move |(evaluator, ticker): (_, Option<time::Interval>)| async move {
                let mut ticker = ticker.unwrap_or_else(|| {
                    let mut ticker = time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                ticker.tick().await;
                let outcome = evaluate_blocking(Arc::clone(&evaluator)).await;
                Some((outcome, (evaluator, Some(ticker))))
            },
        );

        match self.max_cycles {
            Some(limit) => {
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                Box::pin(stream.take(limit))
            }
            None => Box::pin(stream),
        }
    }

    /// Drive the loop, handing each record to `on_record`, until the cycle
    /// limit is reached or `shutdown` resolves. Failed cycles are logged and
    /// skipped.
    pub async fn run<F, Fut>(self, shutdown: Fut, mut on_record: F) -> CycleStats
    where
        F: FnMut(&HealthRecord),
        Fut: Future<Output = ()>,
    {
        info!(period_ms = self.period.as_millis() as u64, "Running system health checks");

        let mut stats = CycleStats::default();
        let mut records = self.into_stream();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Shutdown requested, stopping health checks");
                    break;
                }
                next = records.next() => match next {
                    Some(Ok(record)) => {
                        stats.succeeded += 1;
                        on_record(&record);
                    }
                    Some(Err(err)) => {
                        stats.failed += 1;
                        error!("Health check cycle failed: {}", err);
                    }
                    None => break,
                }
            }
        }

        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Health checks completed"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::config::EvaluatorConfig;
    use crate::metrics::{FixedSampler, Metric};

    fn evaluator(sampler: FixedSampler) -> Arc<HealthEvaluator<FixedSampler>> {
        Arc::new(HealthEvaluator::new(sampler, EvaluatorConfig::default()).unwrap())
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = Scheduler::new(evaluator(FixedSampler::default()), Duration::ZERO);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_after_max_cycles() {
        let evaluator = evaluator(FixedSampler::new(1.0, 2.0, 3.0, 4));
        let scheduler = Scheduler::new(Arc::clone(&evaluator), Duration::from_millis(5))
            .unwrap()
            .with_max_cycles(3);

        let mut seen = Vec::new();
        let stats = scheduler
            .run(std::future::pending(), |record| seen.push(*record))
            .await;

        assert_eq!(stats, CycleStats { succeeded: 3, failed: 0 });
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|r| *r == HealthRecord::new(1.0, 2.0, 3.0, 4)));
        assert_eq!(evaluator.sampler().calls(Metric::Cpu), 3);
    }

    #[tokio::test]
    async fn test_failed_cycles_do_not_stop_the_loop() {
        let scheduler = Scheduler::new(
            evaluator(FixedSampler::new(1.0, 2.0, 3.0, 4).without_disk()),
            Duration::from_millis(5),
        )
        .unwrap()
        .with_max_cycles(2);

        let stats = scheduler
            .run(std::future::pending(), |_| panic!("no record expected"))
            .await;
        assert_eq!(stats, CycleStats { succeeded: 0, failed: 2 });
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_endless_run() {
        let scheduler = Scheduler::new(
            evaluator(FixedSampler::new(1.0, 2.0, 3.0, 4)),
            Duration::from_millis(5),
        )
        .unwrap();

        let stats = scheduler
            .run(time::sleep(Duration::from_millis(30)), |_| {})
            .await;
        assert!(stats.succeeded >= 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_unbounded_cycle_limit() {
        let mut stream = Scheduler::new(
            evaluator(FixedSampler::new(1.0, 2.0, 3.0, 4)),
            Duration::from_millis(5),
        )
        .unwrap()
        .with_max_cycles(u64::MAX)
        .into_stream();

        for _ in 0..3 {
            assert!(stream.next().await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_stream_yields_errors() {
        let mut stream = Scheduler::new(
            evaluator(FixedSampler::new(1.0, 2.0, 3.0, 4).without_disk()),
            Duration::from_millis(5),
        )
        .unwrap()
        .into_stream();

        for _ in 0..2 {
            let item = stream.next().await.unwrap();
            assert!(matches!(item, Err(HealthError::PathNotFound { .. })));
        }
    }
}
