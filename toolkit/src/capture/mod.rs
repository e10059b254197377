//! External tool invocations: a bounded pool of child processes and the
//! `tshark` helpers built on it.

pub mod pool;
pub mod tshark;

pub use pool::{Job, JobOutput, WorkerPool};
