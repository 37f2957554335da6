//! Parallel iteration engine
//!
//! Takes a validated [`WorkContract`](crate::work::WorkContract), splits its
//! iterations into partitions and runs each partition on its own thread.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Balancing**: `WorkBalancer` turns a contract into a partition map (pure, deterministic)
//! - **Execution**: `WorkExecutor` runs one worker per partition and joins them all
//! - **Isolation**: a panicking or failing delegate faults only its own worker
//! - **Cancellation**: workers poll the contract's token between iterations
//!
//! ## What This Module Does NOT Do:
//! - **Ordering across partitions**: only iteration order within a partition is kept
//! - **Timeouts**: callers cancel the token themselves
//! - **Parameter synchronization**: parameters are shared by reference as-is
//!
//! # Flow
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ WorkContract│───▶│ WorkBalancer │───▶│ Worker × N   │───▶│ WorkResult   │
//! │             │    │              │    │              │    │              │
//! │ • iterations│    │ • strategy   │    │ • iterations │    │ • per-part.  │
//! │ • settings  │    │ • thread     │    │ • cancel     │    │   results    │
//! │ • token     │    │   range      │    │ • faults     │    │ • accounting │
//! └─────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use taskripper::parallel::WorkExecutor;
//! use taskripper::work::WorkContract;
//!
//! let contract = WorkContract::new(100).unwrap();
//! let result = WorkExecutor::default()
//!     .compute_with(&contract, |base: &u64| base * 2, &21)
//!     .unwrap();
//!
//! assert!(result.contract_honored());
//! assert!(result.values().all(|value| *value == 42));
//! ```

pub mod balancer;
pub mod executor;
pub mod result;
mod worker;

pub use balancer::{PartitionMap, WorkBalancer};
pub use executor::WorkExecutor;
pub use result::{IterationResult, PartitionReport, WorkResult, WorkSummary, WorkerState};
