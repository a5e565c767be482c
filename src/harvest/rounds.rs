//! Multi-round retry policy
//!
//! The first round runs every unit with the primary pool and attempt budget.
//! Later rounds resubmit only the retryable failures of the previous round,
//! on a smaller pool with a smaller per-unit budget. Pages that loaded
//! without their content are resubmitted only when the policy says so: a
//! listing page without items is often a transient challenge page, a product
//! page without a name is not. Rounds stop when:
//! - nothing is left to retry
//! - `max_rounds` rounds have run
//! - a retry round succeeds for no unit at all
//!
//! Units still failing at that point are reported as permanently failed.

use crate::config::{DetailsConfig, DiscoveryConfig};
use crate::extract::Extractor;
use crate::harvest::runner::TaskRunner;
use crate::harvest::scheduler::{FailedUnit, FailureReason, Scheduler};
use crate::work::WorkUnit;

/// Pool sizes and budgets of a multi-round run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub pool_size: usize,
    pub max_attempts: u32,
    pub retry_pool_size: usize,
    pub retry_max_attempts: u32,

    /// Maximum number of rounds, the first one included
    pub max_rounds: u32,

    /// Resubmit units whose page loaded without extractable content
    pub absent_retryable: bool,
}

impl RetryPolicy {
    /// Pool size and attempt budget for a 1-based round
    pub fn for_round(&self, round: u32) -> (usize, u32) {
        if round <= 1 {
            (self.pool_size, self.max_attempts)
        } else {
            (self.retry_pool_size, self.retry_max_attempts)
        }
    }

    /// Returns true if a unit that failed for `reason` goes to the next round
    pub fn should_resubmit(&self, reason: &FailureReason) -> bool {
        match reason {
            FailureReason::Absent => self.absent_retryable,
            other => other.is_retryable(),
        }
    }
}

impl From<&DiscoveryConfig> for RetryPolicy {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            max_attempts: config.max_attempts,
            retry_pool_size: config.retry_pool_size,
            retry_max_attempts: config.retry_max_attempts,
            max_rounds: config.max_rounds,
            absent_retryable: true,
        }
    }
}

impl From<&DetailsConfig> for RetryPolicy {
    fn from(config: &DetailsConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            max_attempts: config.max_attempts,
            retry_pool_size: config.retry_pool_size,
            retry_max_attempts: config.retry_max_attempts,
            max_rounds: config.max_rounds,
            absent_retryable: false,
        }
    }
}

/// Why the round loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No retryable failure was left
    Drained,

    /// The round cap was reached with retryable failures left
    RoundLimit,

    /// A retry round made no progress
    NoProgress,
}

/// Aggregate result of all rounds
#[derive(Debug)]
pub struct HarvestOutcome<U, T> {
    /// Every successful unit with its output, in completion order
    pub succeeded: Vec<(U, T)>,

    /// Permanently failed units, each with its last failure
    pub failed: Vec<FailedUnit<U>>,

    pub rounds: u32,
    pub attempts: u64,
    pub stop_reason: StopReason,
}

/// Runs units through as many rounds as the policy allows
pub async fn run_with_retries<U, E>(
    runner: &TaskRunner<E>,
    units: Vec<U>,
    policy: &RetryPolicy,
) -> HarvestOutcome<U, <E as Extractor<U>>::Output>
where
    U: WorkUnit,
    E: Extractor<U>,
{
    let mut succeeded = Vec::new();
    let mut permanent = Vec::new();
    let mut pending: Vec<FailedUnit<U>> = Vec::new();
    let mut attempts = 0;
    let mut rounds = 0;
    let mut submit = units;
    let mut stop_reason = StopReason::Drained;

    while !submit.is_empty() {
        if rounds >= policy.max_rounds {
            stop_reason = StopReason::RoundLimit;
            break;
        }
        rounds += 1;

        let (pool_size, max_attempts) = policy.for_round(rounds);
        tracing::info!(
            "Round {}: submitting {} unit(s) to {} worker(s), {} attempt(s) each",
            rounds,
            submit.len(),
            pool_size,
            max_attempts
        );

        let report = Scheduler::new(pool_size)
            .run_all(runner, submit, max_attempts)
            .await;

        let progress = report.succeeded.len();
        attempts += report.attempts;
        succeeded.extend(report.succeeded);

        let (retryable, terminal): (Vec<_>, Vec<_>) = report
            .failed
            .into_iter()
            .partition(|failed| policy.should_resubmit(&failed.reason));
        permanent.extend(terminal);
        pending = retryable;

        tracing::info!(
            "Round {} complete: {} succeeded, {} left to retry, {} permanently failed",
            rounds,
            progress,
            pending.len(),
            permanent.len()
        );

        if rounds > 1 && progress == 0 && !pending.is_empty() {
            tracing::warn!(
                "Round {} made no progress; giving up on {} unit(s)",
                rounds,
                pending.len()
            );
            stop_reason = StopReason::NoProgress;
            break;
        }

        submit = pending.iter().map(|failed| failed.unit.clone()).collect();
    }

    if stop_reason == StopReason::RoundLimit {
        tracing::warn!(
            "Round limit of {} reached; giving up on {} unit(s)",
            policy.max_rounds,
            pending.len()
        );
    }

    permanent.extend(pending);

    HarvestOutcome {
        succeeded,
        failed: permanent,
        rounds,
        attempts,
        stop_reason,
    }
}
