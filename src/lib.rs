//! # taskripper - parallel iteration engine
//!
//! Run a delegate N times across a bounded set of OS threads, with balanced
//! partitions, cooperative cancellation and per-worker fault isolation.
//!
//! ## Features
//!
//! - **Balancing strategies**: optimize, none, minimize or maximize threads
//! - **Cancellation**: one shared token, checked between iterations
//! - **Fault isolation**: a panicking delegate faults its own partition only
//! - **Sync and async**: scoped threads, or tokio's blocking pool from async code
//! - **Layered config**: embedded defaults, files and `TASKRIPPER_*` variables
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskripper::{WorkContract, WorkExecutor};
//!
//! let counter = AtomicUsize::new(0);
//! let contract = WorkContract::new(500).unwrap();
//! let result = WorkExecutor::default()
//!     .execute_with(&contract, |c: &AtomicUsize| { c.fetch_add(1, Ordering::Relaxed); }, &counter)
//!     .unwrap();
//!
//! assert!(result.contract_honored());
//! assert_eq!(counter.load(Ordering::Relaxed), 500);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parallel;
pub mod work;

pub use cli::{Cli, Output};
pub use config::RipperConfig;
pub use error::{WorkError, WorkOutcome, WorkerFault};
pub use parallel::{WorkBalancer, WorkExecutor, WorkResult};
pub use work::{BalancerStrategy, ExecutionEnvironment, ExecutionSettings, Range, Work, WorkContract};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
