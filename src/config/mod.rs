//! Configuration management for taskripper
//!
//! Layered with figment, lowest priority first:
//! embedded `default-config.toml`, the file passed with `--config`,
//! `taskripper.toml` in the working directory, then `TASKRIPPER_*` variables.

use crate::work::{BalancerStrategy, ExecutionEnvironment, ExecutionSettings, ITERATIONS_PER_THREAD, Range};
use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const PROJECT_CONFIG: &str = "taskripper.toml";
const ENV_PREFIX: &str = "TASKRIPPER_";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RipperConfig {
    pub execution: ExecutionConfig,
}

/// `[execution]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub min_threads: usize,
    /// 0 = the environment's thread count
    pub max_threads: usize,
    /// Exclusive upper bound, 0 = `max_threads * 1000`
    pub max_iterations: usize,
    pub strategy: BalancerStrategy,
    pub strict_threads: bool,
}

impl RipperConfig {
    /// Load from the current directory
    pub fn load(custom_config: Option<&Path>) -> Result<Self> {
        Self::load_in(Path::new("."), custom_config)
    }

    /// Load with `dir` standing in for the working directory
    pub fn load_in(dir: &Path, custom_config: Option<&Path>) -> Result<Self> {
        Self::extract(Self::figment(dir, custom_config, ENV_PREFIX)?)
    }

    fn figment(dir: &Path, custom_config: Option<&Path>, env_prefix: &str) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(path) = custom_config {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        // Environment variables always have highest priority
        Ok(figment
            .merge(Toml::file(dir.join(PROJECT_CONFIG)))
            .merge(Env::prefixed(env_prefix).split("__")))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .context("failed to load taskripper configuration")?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Resolve the `[execution]` section against `environment`
    pub fn to_settings(&self, environment: ExecutionEnvironment) -> Result<ExecutionSettings> {
        let execution = &self.execution;
        let max_threads = match execution.max_threads {
            0 => environment.thread_count(),
            n => n,
        };
        let max_iterations = match execution.max_iterations {
            0 => max_threads
                .max(1)
                .checked_mul(ITERATIONS_PER_THREAD)
                .context("execution.max_threads is too large to derive execution.max_iterations")?,
            n => n,
        };

        let thread_range = Range::new(execution.min_threads, max_threads)
            .context("execution.min_threads must not exceed execution.max_threads")?;
        let execution_range =
            Range::new(1, max_iterations).context("execution.max_iterations must be at least 1")?;

        let settings = ExecutionSettings::new(environment, thread_range, execution_range, execution.strategy);
        settings.validate()?;
        Ok(settings)
    }
}
