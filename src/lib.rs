//! PSI benchmark sweep driver
//!
//! This library reads a table of protocol parameters and, for each row,
//! launches an external server and client with identical arguments a fixed
//! number of times.

pub mod cli;
pub mod commands;
pub mod common;
pub mod sweep;

// Re-export commonly used types for tests
pub use common::{Error, Result, SweepConfig};
pub use sweep::{build_invocation, ParameterRow, RunInvocation, SweepRunner};
