//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunState`: counters, remaining item budget and termination cause of one run
//! - `RunEvent`: what components report to the driver
//! - `Deduplicator`: run-scoped set of emitted item numbers

mod dedup;
mod run_state;

// Re-export main types
pub use dedup::Deduplicator;
pub use run_state::{RunEvent, RunState, TerminationCause};
