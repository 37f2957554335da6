//! System Profile Crate
//!
//! Answers one question for the rest of the workspace: how many units of
//! concurrency does this machine offer, and what is it called.
//! All values are computed once on first access and cached for the program lifetime.
//!
//! Uses std::sync::LazyLock (Rust 1.80+) for lazy initialization.

use std::sync::{Arc, LazyLock};

/// Global system profile instance - computed once, cached forever
pub static SYSTEM: LazyLock<Arc<SystemProfile>> = LazyLock::new(|| Arc::new(SystemProfile::detect()));

const UNKNOWN: &str = "Unknown";

/// Host information relevant to sizing worker counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    /// Logical CPUs (including hyperthreading)
    pub cpu_count: usize,

    /// Physical CPU cores (excluding hyperthreading)
    pub physical_cpu_count: usize,

    /// System hostname
    pub hostname: String,

    /// Operating system name
    pub os_name: String,

    /// Operating system version
    pub os_version: String,
}

impl SystemProfile {
    /// Detect system profile (called once via LazyLock)
    fn detect() -> Self {
        use sysinfo::System;

        Self {
            cpu_count: num_cpus::get().max(1),
            physical_cpu_count: num_cpus::get_physical().max(1),
            hostname: System::host_name().unwrap_or_else(|| UNKNOWN.to_string()),
            os_name: System::name().unwrap_or_else(|| UNKNOWN.to_string()),
            os_version: System::os_version().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// Get the global system profile instance
    pub fn get() -> Arc<SystemProfile> {
        SYSTEM.clone()
    }

    /// Logical CPU count of the cached profile
    pub fn cpu_count() -> usize {
        SYSTEM.cpu_count
    }

    /// Check if running on a multi-core system
    pub fn is_multicore() -> bool {
        SYSTEM.cpu_count > 1
    }

    /// Get a human-readable summary of the host
    pub fn summary(&self) -> String {
        format!(
            "Host: {}\n\
             System: {} {}\n\
             CPUs: {} ({} physical)",
            self.hostname, self.os_name, self.os_version, self.cpu_count, self.physical_cpu_count
        )
    }
}
