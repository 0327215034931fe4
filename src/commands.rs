//! CLI command definitions
//!
//! Defines the clap commands for the sweep driver.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::ConfigOverrides;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every configuration in the parameter table
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Server executable (default: ../build/src/ServerMain)
        #[arg(long)]
        server: Option<PathBuf>,

        /// Client executable (default: ../build/src/ClientMain)
        #[arg(long)]
        client: Option<PathBuf>,

        /// Server/client runs per configuration (default: 10)
        #[arg(long, short = 'n')]
        runs: Option<u32>,

        /// Kill a client that runs longer than this many seconds (0 = never)
        #[arg(long)]
        client_timeout: Option<u64>,
    },

    /// Print the invocations a run would launch, without launching anything
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Where the sweep settings and parameters come from
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Config file (default: platform config dir, psi-sweep/config.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Tab-separated parameter table (default: Parameters1.txt)
    #[arg(long, short)]
    pub table: Option<PathBuf>,
}

impl SourceArgs {
    /// Overrides carried by these arguments alone
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            table: self.table.clone(),
            ..Default::default()
        }
    }
}
