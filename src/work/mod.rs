//! Work description types
//!
//! Everything a caller assembles before handing work to the executor:
//! ranges, the execution environment, settings, contracts and the optional
//! mutating `Work` wrapper. All of these are immutable once built and can be
//! shared between threads without synchronization.

pub mod contract;
pub mod environment;
pub mod mutator;
pub mod range;
pub mod settings;

pub use contract::{WorkContract, WorkContractBuilder};
pub use environment::ExecutionEnvironment;
pub use mutator::{MutationOrder, Work};
pub use range::Range;
pub use settings::{BalancerStrategy, ExecutionSettings, ITERATIONS_PER_THREAD};
