use crate::cli::Output;
use crate::config::RipperConfig;
use crate::work::{ExecutionEnvironment, ExecutionSettings};
use anyhow::Result;
use serde::Serialize;
use system_profile::SystemProfile;

#[derive(Serialize)]
struct EnvReport {
    host: ExecutionEnvironment,
    physical_cpus: usize,
    os: String,
    thread_pool: ExecutionEnvironment,
    settings: ExecutionSettings,
    strict_threads: bool,
}

pub fn execute(config: &RipperConfig, output: &Output) -> Result<()> {
    let profile = SystemProfile::get();
    let host = ExecutionEnvironment::host();
    let report = EnvReport {
        settings: config.to_settings(host.clone())?,
        host,
        physical_cpus: profile.physical_cpu_count,
        os: format!("{} {}", profile.os_name, profile.os_version),
        thread_pool: ExecutionEnvironment::from_thread_pool(),
        strict_threads: config.execution.strict_threads,
    };

    if output.is_json() {
        return output.json(&report);
    }

    output.header("Execution environment");
    output.key_value("Host", report.host.label(), false);
    output.key_value("Logical CPUs", &report.host.thread_count().to_string(), true);
    output.key_value("Physical CPUs", &report.physical_cpus.to_string(), false);
    output.key_value("Multicore", &SystemProfile::is_multicore().to_string(), false);
    output.key_value("OS", &report.os, false);
    output.key_value("Thread pool", &report.thread_pool.thread_count().to_string(), false);

    output.header("Resolved settings");
    output.key_value("Thread range", &report.settings.thread_range().to_string(), false);
    output.key_value("Execution range", &report.settings.execution_range().to_string(), false);
    output.key_value("Strategy", &report.settings.balancer_strategy().to_string(), true);
    output.key_value("Strict threads", &report.strict_threads.to_string(), false);
    output.verbose(&profile.summary());
    Ok(())
}
