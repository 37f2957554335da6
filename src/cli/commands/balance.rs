use super::ContractArgs;
use crate::cli::Output;
use crate::config::RipperConfig;
use crate::parallel::{PartitionMap, WorkBalancer};
use crate::work::{BalancerStrategy, Range};
use anyhow::Result;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub contract: ContractArgs,
}

#[derive(Serialize)]
struct BalanceReport {
    strategy: BalancerStrategy,
    iterations: usize,
    thread_range: Range,
    partitions: PartitionMap,
}

pub fn execute(args: BalanceArgs, config: &RipperConfig, output: &Output) -> Result<()> {
    let contract = args.contract.contract(config, "balance preview")?;
    let partitions = WorkBalancer::new().balance(&contract)?;

    let report = BalanceReport {
        strategy: contract.balancer_strategy(),
        iterations: contract.iterations_requested(),
        thread_range: contract.settings().thread_range(),
        partitions,
    };

    if output.is_json() {
        return output.json(&report);
    }

    output.header(&format!(
        "{} iterations, {} over threads {}",
        report.iterations, report.strategy, report.thread_range
    ));
    for (partition, count) in &report.partitions {
        output.table_row(&format!("partition {partition}"), &count.to_string());
    }
    output.success(&format!("{} partition(s)", report.partitions.len()));
    Ok(())
}
