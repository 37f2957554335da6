use crate::error::{WorkError, WorkOutcome};
use crate::work::{BalancerStrategy, WorkContract};
use std::collections::BTreeMap;

/// Partition index (0-based, contiguous) to iteration count
pub type PartitionMap = BTreeMap<usize, usize>;

/// Turns a contract into a partition map.
///
/// Pure: equal contracts always produce equal maps, nothing is spawned here.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkBalancer;

impl WorkBalancer {
    pub fn new() -> Self {
        Self
    }

    /// Split `iterations_requested` across partitions according to the contract's strategy.
    ///
    /// The values always sum to the requested count and none of them is zero.
    pub fn balance(&self, contract: &WorkContract) -> WorkOutcome<PartitionMap> {
        contract.validate()?;

        let iterations = contract.iterations_requested();
        let threads = contract.settings().thread_range();

        let partitions = match contract.balancer_strategy() {
            BalancerStrategy::None => PartitionMap::from([(0, iterations)]),
            BalancerStrategy::MinimizeThreads => split(iterations, threads.start().min(iterations))?,
            BalancerStrategy::MaximizeThreads => split(iterations, threads.end().min(iterations))?,
            BalancerStrategy::Optimize => optimize(iterations, threads.end())?,
        };

        let partitions = remove_empty(partitions);
        tracing::debug!(
            strategy = %contract.balancer_strategy(),
            iterations,
            partitions = partitions.len(),
            "balanced work: {:?}",
            partitions
        );
        Ok(partitions)
    }
}

fn checked_divisor(divisor: usize) -> WorkOutcome<usize> {
    if divisor == 0 {
        return Err(WorkError::InvalidConfiguration(
            "the balancing divisor must be at least 1".to_string(),
        ));
    }
    Ok(divisor)
}

/// `divisor` partitions: the first `divisor - 1` get the quotient, the last also absorbs the remainder
fn split(iterations: usize, divisor: usize) -> WorkOutcome<PartitionMap> {
    let divisor = checked_divisor(divisor)?;
    let (quotient, remainder) = (iterations / divisor, iterations % divisor);

    let mut partitions: PartitionMap = (0..divisor - 1).map(|index| (index, quotient)).collect();
    partitions.insert(divisor - 1, quotient + remainder);
    Ok(partitions)
}

fn optimize(iterations: usize, max_threads: usize) -> WorkOutcome<PartitionMap> {
    let divisor = checked_divisor(max_threads)?;
    let (quotient, remainder) = (iterations / divisor, iterations % divisor);

    // Fewer iterations than threads: one iteration per thread, no idle threads
    if quotient == 0 && remainder <= max_threads {
        return Ok((0..remainder).map(|index| (index, 1)).collect());
    }

    split(iterations, divisor)
}

/// Drop zero-count partitions and renumber the rest from 0
fn remove_empty(partitions: PartitionMap) -> PartitionMap {
    partitions
        .into_values()
        .filter(|count| *count > 0)
        .enumerate()
        .collect()
}
