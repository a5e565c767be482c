//! Pacing between fetch attempts
//!
//! Pacing only spaces out the sequential attempts of one unit. The
//! aggregate request rate is capped by the worker pool size.

use crate::config::PacingConfig;
use std::time::Duration;

/// Decides how long to wait before each fetch attempt
pub trait Pacing: Send + Sync {
    /// Delay before the first attempt of a unit
    fn before_attempt(&self) -> Duration;

    /// Delay before every later attempt of the same unit
    fn before_retry(&self) -> Duration;
}

/// Uniformly random delays drawn from configured ranges
#[derive(Debug, Clone)]
pub struct RandomPacing {
    attempt_range: (u64, u64),
    retry_range: (u64, u64),
}

impl RandomPacing {
    /// Creates a pacing policy from millisecond bounds (inclusive)
    ///
    /// Reversed bounds are swapped.
    pub fn new(attempt_range_ms: (u64, u64), retry_range_ms: (u64, u64)) -> Self {
        Self {
            attempt_range: ordered(attempt_range_ms),
            retry_range: ordered(retry_range_ms),
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            (config.attempt_delay_min_ms, config.attempt_delay_max_ms),
            (config.retry_delay_min_ms, config.retry_delay_max_ms),
        )
    }
}

impl Pacing for RandomPacing {
    fn before_attempt(&self) -> Duration {
        random_delay(self.attempt_range)
    }

    fn before_retry(&self) -> Duration {
        random_delay(self.retry_range)
    }
}

/// Fixed delays; `FixedPacing::zero()` disables pacing entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPacing {
    pub attempt: Duration,
    pub retry: Duration,
}

impl FixedPacing {
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Pacing for FixedPacing {
    fn before_attempt(&self) -> Duration {
        self.attempt
    }

    fn before_retry(&self) -> Duration {
        self.retry
    }
}

fn ordered((a, b): (u64, u64)) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn random_delay((min, max): (u64, u64)) -> Duration {
    Duration::from_millis(rand::random_range(min..=max))
}
