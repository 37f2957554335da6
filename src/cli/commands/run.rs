use super::ContractArgs;
use crate::cli::Output;
use crate::config::RipperConfig;
use crate::error::WorkError;
use crate::parallel::{WorkExecutor, WorkResult, WorkSummary};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Mixing rounds per spin iteration
const SPIN_ROUNDS: u64 = 10_000;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Built-in workload to run on every iteration
    #[arg(short, long, value_enum, default_value_t = Workload::Spin)]
    pub workload: Workload,

    /// Cancel the run after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub cancel_after_ms: Option<u64>,

    /// Fail the Nth delegate invocation (0-based) to exercise fault reporting
    #[arg(long, value_name = "N")]
    pub fail_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// Integer mixing loop, returns a checksum
    Spin,
    /// Primality test of consecutive integers, returns 1 per prime
    Primes,
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Spin => f.write_str("spin"),
            Workload::Primes => f.write_str("primes"),
        }
    }
}

/// Shared by every worker: the invocation counter doubles as the workload input
struct WorkloadState {
    invocations: AtomicU64,
    fail_at: Option<u64>,
}

impl Workload {
    fn invoke(self, state: &WorkloadState) -> Result<u64, String> {
        let n = state.invocations.fetch_add(1, Ordering::Relaxed);
        if state.fail_at == Some(n) {
            return Err(format!("injected failure at invocation {n}"));
        }
        Ok(match self {
            Workload::Spin => spin(n),
            Workload::Primes => u64::from(is_prime(n)),
        })
    }
}

fn spin(seed: u64) -> u64 {
    let mut x = seed ^ 0x9E37_79B9_7F4A_7C15;
    for _ in 0..SPIN_ROUNDS {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
    }
    black_box(x)
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut divisor = 2;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

#[derive(Serialize)]
struct RunReport {
    workload: Workload,
    #[serde(flatten)]
    summary: WorkSummary,
    value_sum: u64,
}

pub async fn execute(args: RunArgs, config: &RipperConfig, output: &Output) -> Result<()> {
    let workload = args.workload;
    let contract = args.contract.contract(config, &format!("{workload} workload"))?;
    output.verbose(&format!(
        "running {} iterations of {workload} with {}",
        contract.iterations_requested(),
        contract.balancer_strategy()
    ));

    let timer = args.cancel_after_ms.map(|ms| {
        let token = contract.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            tracing::info!(ms, "cancelling run");
            token.cancel();
        })
    });

    let state = WorkloadState {
        invocations: AtomicU64::new(0),
        fail_at: args.fail_at,
    };
    let run_contract = contract.clone();
    let result = tokio::task::spawn_blocking(move || {
        WorkExecutor::default().try_compute_with(
            &run_contract,
            |state: &WorkloadState| workload.invoke(state),
            &state,
        )
    })
    .await
    .context("workload task failed")??;

    if let Some(timer) = timer {
        timer.abort();
    }

    report(&result, workload, output)?;

    // Cancellation was asked for, faults were not
    match result.check() {
        Err(err @ WorkError::WorkerFaults(_)) => Err(err.into()),
        _ => Ok(()),
    }
}

fn report(result: &WorkResult<u64>, workload: Workload, output: &Output) -> Result<()> {
    let summary = result.summary();
    let value_sum = result.values().fold(0u64, |acc, value| acc.wrapping_add(*value));

    if output.is_json() {
        return output.json(&RunReport {
            workload,
            summary,
            value_sum,
        });
    }

    output.header(&format!("Run {}", summary.run_id));
    output.key_value("Workload", &workload.to_string(), false);
    output.key_value("Strategy", &summary.strategy.to_string(), false);
    output.key_value("Iterations requested", &summary.iterations_requested.to_string(), false);
    output.key_value("Iterations completed", &summary.total_completed.to_string(), true);
    output.key_value("Partitions", &summary.partitions_used.to_string(), false);
    output.key_value("Duration", &format!("{:.2} ms", summary.duration_ms), false);
    let value_label = match workload {
        Workload::Spin => "Checksum",
        Workload::Primes => "Primes found",
    };
    output.key_value(value_label, &value_sum.to_string(), false);

    if output.is_verbose() {
        for partition in result.partitions() {
            output.table_row(
                &format!("partition {}", partition.partition),
                &format!(
                    "{:?}: {} of {} iterations",
                    partition.state, partition.iterations_run, partition.assigned
                ),
            );
        }
    }

    for fault in &summary.faults {
        output.error(&fault.to_string());
    }
    if result.was_cancelled() {
        output.warning(&format!(
            "cancelled after {} of {} iterations",
            summary.total_completed, summary.iterations_requested
        ));
    }
    output.status_indicator(
        if summary.contract_honored { "HONORED" } else { "NOT HONORED" },
        "contract",
        summary.contract_honored,
    );
    Ok(())
}
