//! Error taxonomy for the iteration engine
//!
//! Configuration and validation errors are returned before any worker starts.
//! Worker faults and cancellation never fail an execute call; they are carried
//! on the returned `WorkResult` and can be turned into a `WorkError` with
//! `WorkResult::check`.

use serde::Serialize;
use std::fmt;

/// Errors produced by the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{requested} iterations is out of the execution range [{start}..{end})")]
    IterationsOutOfRange {
        requested: usize,
        start: usize,
        end: usize,
    },

    #[error("environment thread count {thread_count} cannot satisfy the thread range [{start}..{end})")]
    ThreadOutOfRange {
        thread_count: usize,
        start: usize,
        end: usize,
    },

    #[error("{} worker(s) faulted: {}", .0.len(), summarize(.0))]
    WorkerFaults(Vec<WorkerFault>),

    #[error("work cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },
}

/// A user delegate failure inside one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerFault {
    /// Partition (worker) index
    pub partition: usize,
    /// Iteration within the partition that failed
    pub iteration: usize,
    /// Panic payload or error display
    pub message: String,
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partition {} iteration {}: {}",
            self.partition, self.iteration, self.message
        )
    }
}

fn summarize(faults: &[WorkerFault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias used across the engine
pub type WorkOutcome<T> = std::result::Result<T, WorkError>;
