//! Sweep runner
//!
//! Drives the three stages strictly downstream: table rows become
//! invocations, and every invocation is run `runs_per_config` times through
//! a [`PairLauncher`]. Rows and repeats are processed one after another on
//! the calling task.

use serde::Serialize;

use super::invocation::{build_invocation, RunInvocation};
use super::launcher::{ClientOutcome, CycleId, CycleOutcome, PairLauncher, ServerOutcome};
use super::table::{ParameterRow, ParameterTable};
use crate::common::config::{MissingFieldPolicy, SpawnPolicy, SweepConfig};
use crate::common::{Error, Result};

/// A row that produced no runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub reason: String,
}

/// One row's invocation, as it would be launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRun {
    pub row: usize,
    pub repeats: u32,
    pub invocation: RunInvocation,
}

/// Everything the sweep would launch, without launching it
#[derive(Debug, Default, Serialize)]
pub struct Plan {
    pub runs: Vec<PlannedRun>,
    pub skipped: Vec<SkippedRow>,
}

/// Counters collected over a sweep
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub rows_run: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub cycles: usize,
    pub skipped_cycles: usize,
    pub client_success: usize,
    pub client_failed: usize,
    pub client_spawn_failed: usize,
    pub client_timed_out: usize,
    pub servers_terminated: usize,
}

impl SweepSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome.client {
            ClientOutcome::Success => self.client_success += 1,
            ClientOutcome::Failed { .. } => self.client_failed += 1,
            ClientOutcome::SpawnFailed(_) => self.client_spawn_failed += 1,
            ClientOutcome::TimedOut => self.client_timed_out += 1,
        }
        if outcome.server == ServerOutcome::Terminated {
            self.servers_terminated += 1;
        }
    }
}

/// Runs a configured sweep
pub struct SweepRunner<'a> {
    config: &'a SweepConfig,
}

impl<'a> SweepRunner<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        Self { config }
    }

    /// Open the configured parameter table
    pub fn open_table(&self) -> Result<ParameterTable> {
        ParameterTable::open(
            &self.config.table,
            self.config.delimiter,
            &self.config.parameters,
        )
    }

    /// Read the table and run every row
    ///
    /// Fails before launching anything if the table cannot be opened or its
    /// header is incomplete.
    pub async fn run<L: PairLauncher>(&self, launcher: &mut L) -> Result<SweepSummary> {
        let table = self.open_table()?;
        self.run_rows(table, launcher).await
    }

    /// Run already-read rows
    pub async fn run_rows<I, L>(&self, rows: I, launcher: &mut L) -> Result<SweepSummary>
    where
        I: IntoIterator<Item = Result<ParameterRow>>,
        L: PairLauncher,
    {
        let runs = self.config.runs_per_config;
        let mut summary = SweepSummary::default();

        for row in rows {
            let (row, invocation) = match self.invocation_for(row, &mut summary.skipped_rows)? {
                Some(prepared) => prepared,
                None => continue,
            };

            tracing::info!("Run [{}] {} times", invocation, runs);
            summary.rows_run += 1;

            for repeat in 1..=runs {
                let cycle = CycleId { row, repeat };
                match launcher.run_cycle(&invocation, cycle).await {
                    Ok(outcome) => {
                        if outcome.client != ClientOutcome::Success {
                            tracing::warn!("{}: client ended with {:?}", cycle, outcome.client);
                        }
                        summary.record(&outcome);
                    }
                    Err(e @ Error::Spawn { .. }) => match self.config.on_spawn_error {
                        SpawnPolicy::Abort => return Err(e),
                        SpawnPolicy::SkipCycle => {
                            tracing::warn!("{}: {}, skipping this run", cycle, e);
                            summary.skipped_cycles += 1;
                        }
                        SpawnPolicy::SkipRow => {
                            tracing::warn!("{}: {}, skipping the rest of this row", cycle, e);
                            summary.skipped_cycles += (runs - repeat + 1) as usize;
                            break;
                        }
                    },
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(summary)
    }

    /// Read the table and build every invocation without launching
    pub fn plan(&self) -> Result<Plan> {
        let mut plan = Plan::default();
        for row in self.open_table()? {
            if let Some((row, invocation)) = self.invocation_for(row, &mut plan.skipped)? {
                plan.runs.push(PlannedRun {
                    row,
                    repeats: self.config.runs_per_config,
                    invocation,
                });
            }
        }
        Ok(plan)
    }

    /// Turn a read row into its invocation, applying the missing-field policy
    ///
    /// `Ok(None)` means the row was skipped and recorded in `skipped`.
    fn invocation_for(
        &self,
        row: Result<ParameterRow>,
        skipped: &mut Vec<SkippedRow>,
    ) -> Result<Option<(usize, RunInvocation)>> {
        let built = row.and_then(|row| {
            build_invocation(&self.config.prefix, &self.config.parameters, &row)
                .map(|invocation| (row.number(), invocation))
        });

        match built {
            Ok(prepared) => Ok(Some(prepared)),
            Err(e) if e.is_row_error() => match self.config.on_missing_field {
                MissingFieldPolicy::Abort => Err(e),
                MissingFieldPolicy::SkipRow => {
                    tracing::warn!("Skipping row: {}", e);
                    skipped.push(SkippedRow {
                        reason: e.to_string(),
                    });
                    Ok(None)
                }
            },
            Err(e) => Err(e),
        }
    }
}
