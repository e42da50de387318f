//! Run summary and exit status
//!
//! Folds the final `RunState` and the dispatcher's per-writer report into a
//! [`RunSummary`], prints it, and maps it onto a process exit status.

use super::dispatcher::{DispatchReport, WriterReport};
use crate::state::{RunState, TerminationCause};
use chrono::{DateTime, Local};

/// Everything reported at the end of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub config_hash: String,

    pub max_items: u32,
    pub pages_visited: u32,
    pub records_emitted: u32,
    pub duplicates_suppressed: u32,
    pub parse_anomalies: u32,
    pub transient_failures: u32,
    pub fatal_failures: u32,
    pub item_page_failures: u32,
    pub incomplete_inputs: usize,

    pub termination: TerminationCause,
    pub writers: Vec<WriterReport>,
}

impl RunSummary {
    /// Builds the summary of a finished run
    ///
    /// A run whose loop ended without recording a cause drained its
    /// frontier.
    pub fn from_run(
        state: &RunState,
        report: DispatchReport,
        config_hash: &str,
        started_at: DateTime<Local>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Local::now(),
            config_hash: config_hash.to_string(),
            max_items: state.max_items(),
            pages_visited: state.pages_visited(),
            records_emitted: state.items_emitted(),
            duplicates_suppressed: state.duplicates_suppressed(),
            parse_anomalies: state.parse_anomalies(),
            transient_failures: state.transient_failures(),
            fatal_failures: state.fatal_failures(),
            item_page_failures: state.item_page_failures(),
            incomplete_inputs: state.incomplete_inputs(),
            termination: state.termination().unwrap_or(TerminationCause::FrontierExhausted),
            writers: report.writers,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn writer_failures(&self) -> usize {
        self.writers.iter().filter(|w| w.failed()).count()
    }

    /// Exit status of the run
    ///
    /// | Condition | Status |
    /// |-----------|--------|
    /// | no record emitted | `Failure` |
    /// | a writer failed, an input was unreachable, or the run was cancelled or hit its fatal error budget | `Partial` |
    /// | otherwise | `Success` |
    pub fn exit_status(&self) -> ExitStatus {
        if self.records_emitted == 0 {
            return ExitStatus::Failure;
        }

        let abnormal = matches!(
            self.termination,
            TerminationCause::Cancelled | TerminationCause::FatalErrorBudgetExhausted
        );
        if self.writer_failures() > 0 || self.fatal_failures > 0 || abnormal {
            ExitStatus::Partial
        } else {
            ExitStatus::Success
        }
    }
}

/// Process exit status derived from a run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Partial,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::Partial => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitStatus::Success => "success",
            ExitStatus::Partial => "partial failure",
            ExitStatus::Failure => "failure",
        }
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Overview:");
    println!("  Termination: {}", summary.termination);
    println!("  Status: {}", summary.exit_status().as_str());
    println!("  Elapsed: {:.1}s", summary.elapsed_seconds());
    println!("  Config hash: {}", summary.config_hash);
    println!();

    println!("Progress:");
    println!("  Pages visited: {}", summary.pages_visited);
    println!(
        "  Records emitted: {} (limit {})",
        summary.records_emitted, summary.max_items
    );
    println!("  Duplicates suppressed: {}", summary.duplicates_suppressed);
    println!("  Parse anomalies: {}", summary.parse_anomalies);
    println!();

    println!("Failures:");
    println!("  Transient fetch failures: {}", summary.transient_failures);
    println!("  Fatal fetch failures: {}", summary.fatal_failures);
    println!("  Item page failures: {}", summary.item_page_failures);
    println!("  Incomplete inputs: {}", summary.incomplete_inputs);
    println!();

    if !summary.writers.is_empty() {
        println!("Writers:");
        for writer in &summary.writers {
            match &writer.error {
                Some(error) => println!(
                    "  {}: FAILED after {} records ({})",
                    writer.name, writer.records_written, error
                ),
                None => println!("  {}: {} records", writer.name, writer.records_written),
            }
        }
        println!();
    }
}
