//! Command implementations for the taskripper CLI
//!
//! Each command is organized into its own module. Flags shared by commands
//! that build a contract live here.

pub mod balance;
pub mod env;
pub mod run;

use crate::config::RipperConfig;
use crate::work::{BalancerStrategy, ExecutionEnvironment, WorkContract};
use anyhow::{Context, Result};
use clap::Args;

/// Contract flags; each one overrides the matching `[execution]` key
#[derive(Args, Debug, Clone)]
pub struct ContractArgs {
    /// Number of iterations to run
    #[arg(short = 'n', long)]
    pub iterations: usize,

    /// Balancing strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<BalancerStrategy>,

    /// Minimum partition count
    #[arg(long)]
    pub min_threads: Option<usize>,

    /// Maximum partition count (0 = host logical CPUs)
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Refuse a max thread count above what the host provides
    #[arg(long)]
    pub strict: bool,
}

impl ContractArgs {
    /// Apply the flags over `config` and build a validated contract for the host
    pub fn contract(&self, config: &RipperConfig, description: &str) -> Result<WorkContract> {
        let mut config = config.clone();
        let execution = &mut config.execution;
        if let Some(strategy) = self.strategy {
            execution.strategy = strategy;
        }
        if let Some(min_threads) = self.min_threads {
            execution.min_threads = min_threads;
        }
        if let Some(max_threads) = self.max_threads {
            execution.max_threads = max_threads;
        }
        execution.strict_threads |= self.strict;

        let settings = config.to_settings(ExecutionEnvironment::host())?;
        WorkContract::builder()
            .settings(settings)
            .iterations(self.iterations)
            .strict_threads(config.execution.strict_threads)
            .description(description)
            .build()
            .context("invalid work contract")
    }
}
