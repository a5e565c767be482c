//! Bounded concurrency scheduler
//!
//! This module handles:
//! - Running one task runner invocation per work unit
//! - Capping in-flight units with a semaphore sized to the pool
//! - Collecting reports in completion order on a single collector loop
//! - Partitioning units into succeeded and failed
//!
//! Workers never touch the aggregated results: each task hands its report
//! back through the join set and only the collector mutates the pass report.

use crate::extract::Extractor;
use crate::harvest::fetcher::FetchError;
use crate::harvest::runner::{RunOutcome, TaskReport, TaskRunner};
use crate::work::WorkUnit;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};

/// Completed units between two progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// Why a unit ended up in the failed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The runner exhausted its attempt budget
    GaveUp { last_error: Option<FetchError> },

    /// The page loaded but its primary field was missing
    Absent,

    /// The unit's task failed in a way the runner did not anticipate
    Unexpected { message: String },
}

impl FailureReason {
    /// Returns true if the failure came from fetching or from the task
    ///
    /// Absent units loaded fine; whether they are resubmitted is up to the
    /// stage's `RetryPolicy`.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GaveUp {
                last_error: Some(error),
            } => write!(f, "gave up: {}", error),
            Self::GaveUp { last_error: None } => f.write_str("gave up: no attempts made"),
            Self::Absent => f.write_str("required content absent"),
            Self::Unexpected { message } => write!(f, "unexpected error: {}", message),
        }
    }
}

/// A unit that did not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit<U> {
    pub unit: U,
    pub reason: FailureReason,

    /// Fetch attempts spent on the unit in the pass that failed it
    pub attempts: u32,
}

/// Result of running one set of units through the pool
///
/// Both partitions are in completion order.
#[derive(Debug)]
pub struct PassReport<U, T> {
    pub succeeded: Vec<(U, T)>,
    pub failed: Vec<FailedUnit<U>>,

    /// Total fetch attempts made during the pass
    pub attempts: u64,
}

impl<U, T> Default for PassReport<U, T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            attempts: 0,
        }
    }
}

impl<U, T> PassReport<U, T> {
    fn record(&mut self, unit: U, report: TaskReport<T>) {
        let attempts = report.attempt_count();
        self.attempts += u64::from(attempts);

        match report.outcome {
            RunOutcome::Success(output) => self.succeeded.push((unit, output)),
            RunOutcome::Absent => self.failed.push(FailedUnit {
                unit,
                reason: FailureReason::Absent,
                attempts,
            }),
            RunOutcome::GaveUp { last_error } => self.failed.push(FailedUnit {
                unit,
                reason: FailureReason::GaveUp { last_error },
                attempts,
            }),
        }
    }

    fn record_unexpected(&mut self, unit: U, message: String) {
        self.failed.push(FailedUnit {
            unit,
            reason: FailureReason::Unexpected { message },
            attempts: 0,
        });
    }
}

/// Scheduler runs work units over a fixed-size pool
///
/// The semaphore is the pool: a unit only runs while holding one of its
/// `pool_size` permits, so at most `pool_size` units are pacing or fetching
/// at any time.
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    pool_size: usize,
}

impl Scheduler {
    /// Creates a scheduler with `pool_size` workers (at least one)
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(pool_size)),
            pool_size,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Runs every unit through `runner` and partitions the outcomes
    ///
    /// A unit whose task panics is reported as `Unexpected`; it never aborts
    /// the pass. Every submitted unit appears in exactly one partition.
    pub async fn run_all<U, E>(
        &self,
        runner: &TaskRunner<E>,
        units: Vec<U>,
        max_attempts: u32,
    ) -> PassReport<U, <E as Extractor<U>>::Output>
    where
        U: WorkUnit,
        E: Extractor<U>,
    {
        let total = units.len();
        let mut report = PassReport::default();
        if total == 0 {
            return report;
        }

        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<task::Id, U> = HashMap::with_capacity(total);
        for unit in units {
            let semaphore = Arc::clone(&self.semaphore);
            let runner = runner.clone();
            let tracked = unit.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (unit, Err("worker pool closed".to_string())),
                };

                // The runner gets its own task so a panic inside it is
                // contained and attributed to this unit
                let worker_unit = unit.clone();
                let handle =
                    tokio::spawn(async move { runner.run(&worker_unit, max_attempts).await });

                let result = handle.await.map_err(|e: JoinError| e.to_string());
                (unit, result)
            });
            in_flight.insert(handle.id(), tracked);
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next_with_id().await {
            completed += 1;

            match joined {
                Ok((id, (unit, Ok(task_report)))) => {
                    in_flight.remove(&id);
                    tracing::debug!(
                        "{} finished after {} attempt(s): {}",
                        unit,
                        task_report.attempt_count(),
                        if task_report.outcome.is_success() {
                            "success"
                        } else {
                            "failed"
                        }
                    );
                    report.record(unit, task_report);
                }
                Ok((id, (unit, Err(message)))) => {
                    in_flight.remove(&id);
                    tracing::error!("Unexpected error processing {}: {}", unit, message);
                    report.record_unexpected(unit, message);
                }
                Err(e) => match in_flight.remove(&e.id()) {
                    Some(unit) => {
                        tracing::error!("Worker task for {} failed: {}", unit, e);
                        report.record_unexpected(unit, e.to_string());
                    }
                    None => tracing::error!("Worker task {} failed: {}", e.id(), e),
                },
            }

            if completed % PROGRESS_INTERVAL == 0 || completed == total {
                tracing::info!(
                    "Progress: {}/{} units complete ({} succeeded, {} failed)",
                    completed,
                    total,
                    report.succeeded.len(),
                    report.failed.len()
                );
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extraction;
    use crate::harvest::fetcher::PageFetcher;
    use crate::harvest::identity::Identity;
    use crate::harvest::runner::test_support::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn units(count: usize) -> Vec<TestUnit> {
        (0..count)
            .map(|i| TestUnit(format!("https://shop.example.com/p/{}", i)))
            .collect()
    }

    /// Holds every fetch until the test releases the gate
    struct GatedFetcher {
        gate: Semaphore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GatedFetcher {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for GatedFetcher {
        async fn fetch(
            &self,
            target: &str,
            _identity: &Identity,
            _timeout: Duration,
        ) -> Result<String, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let _pass = self.gate.acquire().await.unwrap();

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(target.to_string())
        }
    }

    /// Answers with the target, except for targets ending in the marker
    struct SelectiveFetcher {
        failing_suffix: &'static str,
    }

    #[async_trait]
    impl PageFetcher for SelectiveFetcher {
        async fn fetch(
            &self,
            target: &str,
            _identity: &Identity,
            _timeout: Duration,
        ) -> Result<String, FetchError> {
            if target.ends_with(self.failing_suffix) {
                Err(transport_error())
            } else {
                Ok(target.to_string())
            }
        }
    }

    struct PanickingExtractor;

    impl Extractor<TestUnit> for PanickingExtractor {
        type Output = String;

        fn extract(&self, body: &str, _unit: &TestUnit) -> Extraction<String> {
            if body.ends_with("/3") {
                panic!("unexpected markup shape");
            }
            Extraction::Found(body.to_string())
        }
    }

    /// A unit whose second copy panics, which happens inside the worker task
    #[derive(Debug)]
    struct FragileUnit {
        target: String,
        copies: Arc<AtomicUsize>,
    }

    impl Clone for FragileUnit {
        fn clone(&self) -> Self {
            if self.copies.fetch_add(1, Ordering::SeqCst) == 1 {
                panic!("unit copy failed");
            }
            Self {
                target: self.target.clone(),
                copies: Arc::clone(&self.copies),
            }
        }
    }

    impl PartialEq for FragileUnit {
        fn eq(&self, other: &Self) -> bool {
            self.target == other.target
        }
    }

    impl Eq for FragileUnit {}

    impl std::hash::Hash for FragileUnit {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.target.hash(state);
        }
    }

    impl fmt::Display for FragileUnit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.target)
        }
    }

    impl WorkUnit for FragileUnit {
        fn target(&self) -> &str {
            &self.target
        }
    }

    #[tokio::test]
    async fn test_empty_work_set() {
        let fetcher = Arc::new(ScriptedFetcher::always(Ok("x".to_string())));
        let runner = runner_with(fetcher, BodyExtractor);

        let report = Scheduler::new(4).run_all(&runner, Vec::<TestUnit>::new(), 3).await;

        assert!(report.succeeded.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.attempts, 0);
    }

    #[tokio::test]
    async fn test_all_units_succeed() {
        let fetcher = Arc::new(SelectiveFetcher {
            failing_suffix: "never",
        });
        let runner = runner_with(fetcher, BodyExtractor);

        let report = Scheduler::new(3).run_all(&runner, units(12), 2).await;

        assert_eq!(report.succeeded.len(), 12);
        assert!(report.failed.is_empty());
        assert_eq!(report.attempts, 12);
        for (unit, body) in &report.succeeded {
            assert_eq!(&unit.0, body);
        }
    }

    #[tokio::test]
    async fn test_partition_of_succeeded_and_failed() {
        let fetcher = Arc::new(SelectiveFetcher {
            failing_suffix: "/4",
        });
        let runner = runner_with(fetcher, BodyExtractor);
        let submitted = units(6);

        let report = Scheduler::new(2).run_all(&runner, submitted.clone(), 3).await;

        assert_eq!(report.succeeded.len(), 5);
        assert_eq!(report.failed.len(), 1);

        let failed = &report.failed[0];
        assert_eq!(failed.unit.0, "https://shop.example.com/p/4");
        assert_eq!(failed.attempts, 3);
        assert_eq!(
            failed.reason,
            FailureReason::GaveUp {
                last_error: Some(transport_error())
            }
        );
        assert_eq!(report.attempts, 5 + 3);

        let mut seen: HashSet<TestUnit> =
            report.succeeded.iter().map(|(u, _)| u.clone()).collect();
        seen.extend(report.failed.iter().map(|f| f.unit.clone()));
        assert_eq!(seen, submitted.into_iter().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn test_absent_units_are_failed_but_not_retryable() {
        let fetcher = Arc::new(ScriptedFetcher::always(Ok(String::new())));
        let runner = runner_with(fetcher, BodyExtractor);

        let report = Scheduler::new(2).run_all(&runner, units(2), 5).await;

        assert_eq!(report.failed.len(), 2);
        for failed in &report.failed {
            assert_eq!(failed.reason, FailureReason::Absent);
            assert!(!failed.reason.is_retryable());
            assert_eq!(failed.attempts, 1);
        }
    }

    #[tokio::test]
    async fn test_panicking_unit_is_contained() {
        let fetcher = Arc::new(SelectiveFetcher {
            failing_suffix: "never",
        });
        let runner = runner_with(fetcher, PanickingExtractor);

        let report = Scheduler::new(3).run_all(&runner, units(6), 2).await;

        assert_eq!(report.succeeded.len(), 5);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].unit.0, "https://shop.example.com/p/3");
        assert!(matches!(
            report.failed[0].reason,
            FailureReason::Unexpected { .. }
        ));
        assert!(report.failed[0].reason.is_retryable());
    }

    #[tokio::test]
    async fn test_failed_worker_task_keeps_its_unit() {
        let fetcher = Arc::new(ScriptedFetcher::always(Ok("x".to_string())));
        let runner = runner_with(fetcher.clone(), BodyExtractor);
        let unit = FragileUnit {
            target: "https://shop.example.com/p/fragile".to_string(),
            copies: Arc::new(AtomicUsize::new(0)),
        };

        let report = Scheduler::new(1).run_all(&runner, vec![unit], 2).await;

        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].unit.target, "https://shop.example.com/p/fragile");
        assert!(matches!(
            report.failed[0].reason,
            FailureReason::Unexpected { .. }
        ));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_pool_size_bounds_in_flight_fetches() {
        const POOL: usize = 3;
        const UNITS: usize = 10;

        let fetcher = Arc::new(GatedFetcher::new());
        let runner = runner_with(fetcher.clone(), BodyExtractor);

        let pass = tokio::spawn(async move {
            Scheduler::new(POOL).run_all(&runner, units(UNITS), 1).await
        });

        // Wait until the pool is saturated
        let saturated = tokio::time::timeout(Duration::from_secs(5), async {
            while fetcher.in_flight.load(Ordering::SeqCst) < POOL {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(saturated.is_ok(), "pool never reached {} in-flight fetches", POOL);

        // Give any excess task a chance to start
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), POOL);

        fetcher.gate.add_permits(UNITS);
        let report = pass.await.unwrap();

        assert_eq!(report.succeeded.len(), UNITS);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), POOL);
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::GaveUp {
            last_error: Some(FetchError::HttpStatus { code: 502 }),
        };
        assert_eq!(reason.to_string(), "gave up: HTTP status 502");
        assert_eq!(FailureReason::Absent.to_string(), "required content absent");
    }

    #[test]
    fn test_zero_pool_size_is_clamped() {
        assert_eq!(Scheduler::new(0).pool_size(), 1);
    }
}
