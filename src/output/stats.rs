//! Run summaries
//!
//! Each stage produces a `HarvestSummary` once its rounds are finished and
//! its output is written. The binary prints it to stdout.

use crate::harvest::{FailureReason, HarvestOutcome, StopReason};
use chrono::{DateTime, Utc};

/// Summary of one stage run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    /// Stage name ("links" or "details")
    pub stage: &'static str,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Number of units submitted in the first round
    pub units: usize,

    pub succeeded: usize,

    /// Permanently failed units, absent ones included
    pub failed: usize,

    /// Units whose pages lacked the required content
    pub absent: usize,

    pub rounds: u32,

    /// Total fetch attempts across all rounds
    pub attempts: u64,

    pub stop_reason: StopReason,

    /// Number of rows written to the stage output
    pub written: usize,
}

impl HarvestSummary {
    /// Builds a summary from a finished multi-round run
    pub fn from_outcome<U, T>(
        stage: &'static str,
        started_at: DateTime<Utc>,
        units: usize,
        outcome: &HarvestOutcome<U, T>,
        written: usize,
    ) -> Self {
        let absent = outcome
            .failed
            .iter()
            .filter(|failed| failed.reason == FailureReason::Absent)
            .count();

        Self {
            stage,
            started_at,
            finished_at: Utc::now(),
            units,
            succeeded: outcome.succeeded.len(),
            failed: outcome.failed.len(),
            absent,
            rounds: outcome.rounds,
            attempts: outcome.attempts,
            stop_reason: outcome.stop_reason,
            written,
        }
    }

    /// Percentage of submitted units that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.units > 0 {
            (self.succeeded as f64 / self.units as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Prints a stage summary to stdout
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary: {} ===\n", summary.stage);

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Elapsed: {:.1}s", summary.elapsed().num_milliseconds() as f64 / 1000.0);
    println!("  Rounds: {} ({:?})", summary.rounds, summary.stop_reason);
    println!("  Fetch attempts: {}", summary.attempts);
    println!();

    println!("Units:");
    println!("  Submitted: {}", summary.units);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    if summary.absent > 0 {
        println!("    of which content absent: {}", summary.absent);
    }
    println!("  Rows written: {}", summary.written);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} units harvested)",
        summary.success_rate(),
        summary.succeeded,
        summary.units
    );
}
