//! Work contracts
//!
//! A `WorkContract` is the validated, immutable description of one execution
//! request. It is checked when built and again by the balancer and executor,
//! so a contract that exists is always runnable.

use crate::error::{WorkError, WorkOutcome};
use crate::work::{BalancerStrategy, ExecutionSettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One unit of work: how many iterations, under which bounds, cancellable through which token
#[derive(Debug, Clone)]
pub struct WorkContract {
    iterations_requested: usize,
    settings: ExecutionSettings,
    balancer_strategy: BalancerStrategy,
    cancellation: Arc<CancellationToken>,
    description: Option<String>,
    strict_threads: bool,
}

impl WorkContract {
    /// Contract over the default settings with a fresh cancellation token
    pub fn new(iterations_requested: usize) -> WorkOutcome<Self> {
        Self::builder().iterations(iterations_requested).build()
    }

    /// Contract over explicit settings; the strategy comes from the settings
    pub fn with_settings(settings: ExecutionSettings, iterations_requested: usize) -> WorkOutcome<Self> {
        Self::builder()
            .settings(settings)
            .iterations(iterations_requested)
            .build()
    }

    pub fn builder() -> WorkContractBuilder {
        WorkContractBuilder::default()
    }

    /// Check the contract against its own settings
    pub fn validate(&self) -> WorkOutcome<()> {
        self.settings.validate()?;

        let execution_range = self.settings.execution_range();
        if self.iterations_requested == 0 || !execution_range.contains(self.iterations_requested) {
            return Err(WorkError::IterationsOutOfRange {
                requested: self.iterations_requested,
                start: execution_range.start(),
                end: execution_range.end(),
            });
        }

        if self.strict_threads {
            let thread_range = self.settings.thread_range();
            let thread_count = self.settings.environment().thread_count();
            if thread_count < thread_range.end() {
                return Err(WorkError::ThreadOutOfRange {
                    thread_count,
                    start: thread_range.start(),
                    end: thread_range.end(),
                });
            }
        }

        Ok(())
    }

    pub fn iterations_requested(&self) -> usize {
        self.iterations_requested
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    pub fn balancer_strategy(&self) -> BalancerStrategy {
        self.balancer_strategy
    }

    /// Token shared by every worker of a run
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cooperative cancellation of any run using this contract
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Shared handle to the token; pass it to another builder to share identity and signal
    pub fn cancellation_handle(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.cancellation)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn strict_threads(&self) -> bool {
        self.strict_threads
    }
}

impl PartialEq for WorkContract {
    fn eq(&self, other: &Self) -> bool {
        self.iterations_requested == other.iterations_requested
            && self.balancer_strategy == other.balancer_strategy
            && self.strict_threads == other.strict_threads
            && self.description == other.description
            && self.settings == other.settings
            // tokens compare by identity, not by state
            && Arc::ptr_eq(&self.cancellation, &other.cancellation)
    }
}

impl Eq for WorkContract {}

/// Assembles a `WorkContract`; `build` runs the same validation as the executor
#[derive(Debug, Default)]
pub struct WorkContractBuilder {
    iterations: Option<usize>,
    settings: Option<ExecutionSettings>,
    balancer_strategy: Option<BalancerStrategy>,
    cancellation: Option<Arc<CancellationToken>>,
    description: Option<String>,
    strict_threads: bool,
}

impl WorkContractBuilder {
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Overrides the strategy carried by the settings
    pub fn strategy(mut self, strategy: BalancerStrategy) -> Self {
        self.balancer_strategy = Some(strategy);
        self
    }

    /// Contracts built from the same `Arc` compare equal on the token; a bare token gets its own handle
    pub fn cancellation(mut self, token: impl Into<Arc<CancellationToken>>) -> Self {
        self.cancellation = Some(token.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fail validation when the environment has fewer threads than the thread range allows
    pub fn strict_threads(mut self, strict: bool) -> Self {
        self.strict_threads = strict;
        self
    }

    pub fn build(self) -> WorkOutcome<WorkContract> {
        let iterations_requested = self.iterations.ok_or_else(|| {
            WorkError::InvalidConfiguration("iteration count was not set".to_string())
        })?;
        let settings = self.settings.unwrap_or_default();
        let balancer_strategy = self
            .balancer_strategy
            .unwrap_or_else(|| settings.balancer_strategy());

        let contract = WorkContract {
            iterations_requested,
            settings,
            balancer_strategy,
            cancellation: self.cancellation.unwrap_or_default(),
            description: self.description,
            strict_threads: self.strict_threads,
        };
        contract.validate()?;
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::{ExecutionEnvironment, Range};

    fn settings(threads: usize, max_iterations: usize) -> ExecutionSettings {
        ExecutionSettings::new(
            ExecutionEnvironment::new(threads, "test"),
            Range::new(1, threads).unwrap(),
            Range::new(1, max_iterations).unwrap(),
            BalancerStrategy::Optimize,
        )
    }

    #[test]
    fn test_contract_within_range() {
        let contract = WorkContract::with_settings(settings(4, 101), 100).unwrap();
        assert_eq!(contract.iterations_requested(), 100);
        assert_eq!(contract.balancer_strategy(), BalancerStrategy::Optimize);
        assert!(!contract.is_cancelled());
    }

    #[test]
    fn test_upper_bound_is_exclusive() {
        let err = WorkContract::with_settings(settings(4, 100), 100).unwrap_err();
        assert_eq!(
            err,
            WorkError::IterationsOutOfRange {
                requested: 100,
                start: 1,
                end: 100
            }
        );
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = WorkContract::with_settings(settings(4, 100), 0).unwrap_err();
        assert!(matches!(err, WorkError::IterationsOutOfRange { requested: 0, .. }));
    }

    #[test]
    fn test_strict_threads() {
        let lenient = ExecutionSettings::new(
            ExecutionEnvironment::new(2, "small"),
            Range::new(1, 8).unwrap(),
            Range::new(1, 1000).unwrap(),
            BalancerStrategy::Optimize,
        );

        assert!(WorkContract::with_settings(lenient.clone(), 10).is_ok());

        let err = WorkContract::builder()
            .settings(lenient)
            .iterations(10)
            .strict_threads(true)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            WorkError::ThreadOutOfRange {
                thread_count: 2,
                start: 1,
                end: 8
            }
        );
    }

    #[test]
    fn test_builder_requires_iterations() {
        let err = WorkContract::builder().build().unwrap_err();
        assert!(matches!(err, WorkError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_builder_strategy_overrides_settings() {
        let contract = WorkContract::builder()
            .settings(settings(4, 1000))
            .strategy(BalancerStrategy::MaximizeThreads)
            .iterations(10)
            .description("squares")
            .build()
            .unwrap();
        assert_eq!(contract.balancer_strategy(), BalancerStrategy::MaximizeThreads);
        assert_eq!(contract.description(), Some("squares"));
    }

    #[test]
    fn test_equality_uses_token_identity() {
        let contract = WorkContract::with_settings(settings(4, 1000), 10).unwrap();
        assert_eq!(contract, contract.clone());

        let shared = Arc::new(CancellationToken::new());
        let build = |token: Arc<CancellationToken>| {
            WorkContract::builder()
                .settings(settings(4, 1000))
                .iterations(10)
                .cancellation(token)
                .build()
                .unwrap()
        };
        let a = build(Arc::clone(&shared));
        let b = build(Arc::clone(&shared));
        assert_eq!(a, b);
        assert_eq!(a, build(b.cancellation_handle()));

        // same settings, different signal
        let other = build(Arc::new(CancellationToken::new()));
        assert_ne!(a, other);
        assert_ne!(contract, WorkContract::with_settings(settings(4, 1000), 10).unwrap());

        b.cancel();
        assert!(a.is_cancelled());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_cancel_reaches_caller_token() {
        let token = CancellationToken::new();
        let contract = WorkContract::builder()
            .settings(settings(4, 1000))
            .iterations(10)
            .cancellation(token.clone())
            .build()
            .unwrap();
        contract.cancel();
        assert!(token.is_cancelled());
        assert!(contract.is_cancelled());
    }
}
