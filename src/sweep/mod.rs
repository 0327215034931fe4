//! Parameter sweep over paired server/client benchmark runs
//!
//! Data flows one way: [`table`] reads configurations, [`invocation`]
//! turns each into an argument vector, [`launcher`] runs the process pair,
//! and [`runner`] ties them together.

pub mod invocation;
pub mod launcher;
pub mod runner;
pub mod table;

pub use invocation::{build_invocation, RunInvocation};
pub use launcher::{
    ClientOutcome, CycleId, CycleOutcome, PairLauncher, ProcessPairLauncher, Role, ServerGuard,
    ServerOutcome,
};
pub use runner::{Plan, PlannedRun, SkippedRow, SweepRunner, SweepSummary};
pub use table::{ParameterRow, ParameterTable};
