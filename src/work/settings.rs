use crate::error::{WorkError, WorkOutcome};
use crate::work::{ExecutionEnvironment, Range};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Iterations allowed per thread in the default execution range
pub const ITERATIONS_PER_THREAD: usize = 1000;

static DEFAULT_SETTINGS: LazyLock<ExecutionSettings> =
    LazyLock::new(|| ExecutionSettings::for_environment(ExecutionEnvironment::host()));

/// How the balancer maps an iteration count onto partitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum BalancerStrategy {
    /// Use up to the maximum thread count, one iteration per thread when there are fewer iterations than threads
    #[default]
    Optimize,
    /// Run everything on a single partition
    None,
    /// Split evenly over the minimum thread count
    MinimizeThreads,
    /// Split evenly over the maximum thread count
    MaximizeThreads,
}

impl fmt::Display for BalancerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BalancerStrategy::Optimize => "optimize",
            BalancerStrategy::None => "none",
            BalancerStrategy::MinimizeThreads => "minimize_threads",
            BalancerStrategy::MaximizeThreads => "maximize_threads",
        };
        f.write_str(name)
    }
}

/// Immutable execution bounds shared by every contract built from them
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExecutionSettings {
    thread_range: Range,
    execution_range: Range,
    environment: ExecutionEnvironment,
    balancer_strategy: BalancerStrategy,
}

impl ExecutionSettings {
    pub fn new(
        environment: ExecutionEnvironment,
        thread_range: Range,
        execution_range: Range,
        balancer_strategy: BalancerStrategy,
    ) -> Self {
        Self {
            thread_range,
            execution_range,
            environment,
            balancer_strategy,
        }
    }

    /// `[1, threads]` threads, `[1, threads * 1000)` iterations, `Optimize`; the iteration bound saturates
    pub fn for_environment(environment: ExecutionEnvironment) -> Self {
        let threads = environment.thread_count().max(1);
        Self {
            thread_range: Range::from_one(threads),
            execution_range: Range::from_one(threads.saturating_mul(ITERATIONS_PER_THREAD)),
            environment,
            balancer_strategy: BalancerStrategy::Optimize,
        }
    }

    /// Copy with a different strategy
    pub fn with_strategy(&self, balancer_strategy: BalancerStrategy) -> Self {
        Self {
            balancer_strategy,
            ..self.clone()
        }
    }

    /// Structural checks performed before any balancing
    pub fn validate(&self) -> WorkOutcome<()> {
        if self.environment.thread_count() == 0 {
            return Err(WorkError::InvalidConfiguration(format!(
                "environment '{}' reports zero threads",
                self.environment.label()
            )));
        }
        Ok(())
    }

    pub fn thread_range(&self) -> Range {
        self.thread_range
    }

    pub fn execution_range(&self) -> Range {
        self.execution_range
    }

    pub fn environment(&self) -> &ExecutionEnvironment {
        &self.environment
    }

    pub fn balancer_strategy(&self) -> BalancerStrategy {
        self.balancer_strategy
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        DEFAULT_SETTINGS.clone()
    }
}
