use serde::Serialize;
use std::sync::LazyLock;
use system_profile::SystemProfile;

/// Host environment computed once from the system profile
static HOST: LazyLock<ExecutionEnvironment> = LazyLock::new(|| {
    let profile = SystemProfile::get();
    ExecutionEnvironment::new(profile.cpu_count, profile.hostname.clone())
});

/// Number of concurrency units available to the engine plus a label naming where they live
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExecutionEnvironment {
    thread_count: usize,
    label: String,
}

impl ExecutionEnvironment {
    pub fn new(thread_count: usize, label: impl Into<String>) -> Self {
        Self {
            thread_count,
            label: label.into(),
        }
    }

    /// The local machine: logical CPU count and host name
    pub fn host() -> Self {
        HOST.clone()
    }

    /// Fixed thread count on the local host, for deterministic setups
    pub fn with_threads(thread_count: usize) -> Self {
        Self::new(thread_count, HOST.label.clone())
    }

    /// Size of the rayon global pool (honours `RAYON_NUM_THREADS`)
    pub fn from_thread_pool() -> Self {
        Self::new(rayon::current_num_threads(), HOST.label.clone())
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
