//! Aggregated outcome of one execute call

use crate::error::{WorkError, WorkOutcome, WorkerFault};
use crate::work::{BalancerStrategy, WorkContract};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Output of one iteration of a value-returning delegate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationResult<T> {
    /// Partition (worker) that produced the value
    pub partition: usize,
    /// Iteration index within that partition
    pub iteration: usize,
    pub value: T,
}

/// Lifecycle of one worker: `Created -> Running -> {Completed | Cancelled | Faulted}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Created,
    Running,
    /// Every assigned iteration ran
    Completed,
    /// Stopped at an iteration boundary because the token was cancelled
    Cancelled,
    /// The delegate failed; iterations after the failure were abandoned
    Faulted,
}

/// What one worker did with its partition
#[derive(Debug, Clone)]
pub struct PartitionReport<T> {
    pub partition: usize,
    /// Iterations the balancer assigned
    pub assigned: usize,
    pub state: WorkerState,
    /// Delegate invocations that returned normally
    pub iterations_run: usize,
    /// Values in iteration order; empty for actions and for cancelled workers
    pub results: Vec<IterationResult<T>>,
    pub fault: Option<WorkerFault>,
}

impl<T> PartitionReport<T> {
    /// Iterations this worker contributes to the total.
    ///
    /// A cancelled worker accounts for none of its iterations, a faulted one for those run before the fault.
    pub fn accounted(&self) -> usize {
        match self.state {
            WorkerState::Completed => self.assigned,
            WorkerState::Faulted => self.iterations_run,
            WorkerState::Cancelled | WorkerState::Created | WorkerState::Running => 0,
        }
    }
}

/// Result of running a contract
#[derive(Debug, Clone)]
pub struct WorkResult<T> {
    contract: WorkContract,
    run_id: Uuid,
    duration: Duration,
    partitions: Vec<PartitionReport<T>>,
    completed: bool,
}

impl<T> WorkResult<T> {
    pub(crate) fn new(
        contract: WorkContract,
        run_id: Uuid,
        duration: Duration,
        mut partitions: Vec<PartitionReport<T>>,
    ) -> Self {
        partitions.sort_by_key(|report| report.partition);
        let completed = !partitions.is_empty()
            && partitions
                .iter()
                .all(|report| report.state == WorkerState::Completed);

        Self {
            contract,
            run_id,
            duration,
            partitions,
            completed,
        }
    }

    /// Contract this result was produced from
    pub fn contract(&self) -> &WorkContract {
        &self.contract
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wall-clock time from validation to the last worker joining
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn partitions_used(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[PartitionReport<T>] {
        &self.partitions
    }

    /// Every worker finished all of its iterations
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Iterations fully accounted for across all partitions
    pub fn total_completed(&self) -> usize {
        self.partitions.iter().map(PartitionReport::accounted).sum()
    }

    pub fn contract_honored(&self) -> bool {
        self.completed && self.total_completed() == self.contract.iterations_requested()
    }

    /// Results of partition `index`, empty when out of range
    pub fn from_partition(&self, index: usize) -> &[IterationResult<T>] {
        self.partitions
            .get(index)
            .map(|report| report.results.as_slice())
            .unwrap_or(&[])
    }

    /// Result `iteration` of partition `partition`
    pub fn from_index(&self, partition: usize, iteration: usize) -> Option<&IterationResult<T>> {
        self.from_partition(partition).get(iteration)
    }

    /// Per-partition result sequences ordered by partition index
    pub fn results_by_partition(&self) -> impl Iterator<Item = &[IterationResult<T>]> {
        self.partitions.iter().map(|report| report.results.as_slice())
    }

    /// All values, partition by partition
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.results_by_partition()
            .flat_map(|results| results.iter().map(|result| &result.value))
    }

    pub fn faults(&self) -> impl Iterator<Item = &WorkerFault> {
        self.partitions.iter().filter_map(|report| report.fault.as_ref())
    }

    pub fn was_cancelled(&self) -> bool {
        self.partitions
            .iter()
            .any(|report| report.state == WorkerState::Cancelled)
    }

    /// Faults take precedence over cancellation
    pub fn check(&self) -> WorkOutcome<()> {
        let faults: Vec<WorkerFault> = self.faults().cloned().collect();
        if !faults.is_empty() {
            return Err(WorkError::WorkerFaults(faults));
        }
        if self.was_cancelled() {
            return Err(WorkError::Cancelled {
                completed: self.total_completed(),
                requested: self.contract.iterations_requested(),
            });
        }
        Ok(())
    }

    pub fn summary(&self) -> WorkSummary {
        WorkSummary {
            run_id: self.run_id,
            description: self.contract.description().map(str::to_string),
            strategy: self.contract.balancer_strategy(),
            iterations_requested: self.contract.iterations_requested(),
            total_completed: self.total_completed(),
            partitions_used: self.partitions_used(),
            duration_ms: self.duration.as_secs_f64() * 1000.0,
            completed: self.completed,
            contract_honored: self.contract_honored(),
            faults: self.faults().cloned().collect(),
        }
    }
}

/// Serializable snapshot of a `WorkResult`
#[derive(Debug, Clone, Serialize)]
pub struct WorkSummary {
    pub run_id: Uuid,
    pub description: Option<String>,
    pub strategy: BalancerStrategy,
    pub iterations_requested: usize,
    pub total_completed: usize,
    pub partitions_used: usize,
    pub duration_ms: f64,
    pub completed: bool,
    pub contract_honored: bool,
    pub faults: Vec<WorkerFault>,
}
