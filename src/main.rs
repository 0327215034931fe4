//! psi-sweep - parameter sweep driver for PSI benchmarks
//!
//! Reads a table of protocol parameters and runs the server and client
//! binaries as a pair, a fixed number of times per configuration.

use clap::Parser;
use commands::Commands;
use psi_sweep::{cli, commands, common::logging};

#[derive(Parser)]
#[command(name = "psi-sweep", about = "Parameter sweep driver for PSI server/client benchmarks")]
#[command(version, long_about = None)]
struct Cli {
    /// Log every cycle (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
