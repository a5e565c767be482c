//! Retrying task runner
//!
//! Runs one work unit through up to `max_attempts` fetch attempts:
//!
//! 1. Wait the pacing delay (attempt delay first, retry delay afterwards)
//! 2. Draw a fresh identity
//! 3. Fetch the unit's target
//! 4. On failure, record the attempt and try again while budget remains
//! 5. On success, extract and return immediately
//!
//! An `Absent` extraction ends the unit without consuming more budget:
//! refetching static markup does not make a missing field appear.

use crate::extract::{Extraction, Extractor};
use crate::harvest::fetcher::{FetchError, PageFetcher};
use crate::harvest::identity::IdentitySource;
use crate::harvest::pacing::Pacing;
use crate::work::WorkUnit;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// The target answered with a 2xx body of this many bytes
    Fetched { bytes: usize },
    Failed(FetchError),
}

/// Record of one try, kept only for the lifetime of a task report
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// 1-based attempt index
    pub index: u32,

    /// User agent used for the attempt
    pub user_agent: String,

    pub result: AttemptResult,
}

/// Terminal state of one work unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<T> {
    /// The page was fetched and the extractor found its primary field
    Success(T),

    /// The page was fetched but the extractor found nothing to return
    Absent,

    /// Every attempt failed; carries the last failure, if any attempt ran
    GaveUp { last_error: Option<FetchError> },
}

impl<T> RunOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Everything a runner invocation produced
#[derive(Debug, Clone)]
pub struct TaskReport<T> {
    pub outcome: RunOutcome<T>,
    pub attempts: Vec<FetchAttempt>,
}

impl<T> TaskReport<T> {
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Runs work units through pacing, identity rotation, fetch and extraction
///
/// The runner is cheap to clone and holds no per-unit state, so one instance
/// serves every worker of a pool.
pub struct TaskRunner<E> {
    fetcher: Arc<dyn PageFetcher>,
    identities: Arc<dyn IdentitySource>,
    pacing: Arc<dyn Pacing>,
    extractor: Arc<E>,
    timeout: Duration,
}

impl<E> Clone for TaskRunner<E> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            identities: Arc::clone(&self.identities),
            pacing: Arc::clone(&self.pacing),
            extractor: Arc::clone(&self.extractor),
            timeout: self.timeout,
        }
    }
}

impl<E> TaskRunner<E> {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        identities: Arc<dyn IdentitySource>,
        pacing: Arc<dyn Pacing>,
        extractor: E,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            identities,
            pacing,
            extractor: Arc::new(extractor),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one unit with the given attempt budget
    ///
    /// Makes at most `max_attempts` fetches and always returns a report;
    /// failures never propagate past this call.
    pub async fn run<U>(
        &self,
        unit: &U,
        max_attempts: u32,
    ) -> TaskReport<<E as Extractor<U>>::Output>
    where
        U: WorkUnit,
        E: Extractor<U>,
    {
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut last_error = None;

        for index in 1..=max_attempts {
            let delay = if index == 1 {
                self.pacing.before_attempt()
            } else {
                self.pacing.before_retry()
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let identity = self.identities.next_identity();
            tracing::trace!(
                "Fetching {} (attempt {}/{}) as {}",
                unit,
                index,
                max_attempts,
                identity.user_agent()
            );

            match self.fetcher.fetch(unit.target(), &identity, self.timeout).await {
                Ok(body) => {
                    attempts.push(FetchAttempt {
                        index,
                        user_agent: identity.user_agent().to_string(),
                        result: AttemptResult::Fetched { bytes: body.len() },
                    });

                    let outcome = match self.extractor.extract(&body, unit) {
                        Extraction::Found(output) => RunOutcome::Success(output),
                        Extraction::Absent => {
                            tracing::warn!("No extractable content found for {}", unit);
                            RunOutcome::Absent
                        }
                    };
                    return TaskReport { outcome, attempts };
                }
                Err(error) => {
                    tracing::warn!(
                        "Error fetching {} (attempt {}/{}, {}): {}",
                        unit,
                        index,
                        max_attempts,
                        error.kind(),
                        error
                    );
                    attempts.push(FetchAttempt {
                        index,
                        user_agent: identity.user_agent().to_string(),
                        result: AttemptResult::Failed(error.clone()),
                    });
                    last_error = Some(error);
                }
            }
        }

        tracing::debug!("Giving up on {} after {} attempts", unit, attempts.len());
        TaskReport {
            outcome: RunOutcome::GaveUp { last_error },
            attempts,
        }
    }
}
