//! CLI command handling
//!
//! Loads configuration, dispatches commands and formats output.

use colored::Colorize;

use crate::commands::{Commands, SourceArgs};
use crate::common::{Config, ConfigOverrides, Error, Result, SweepConfig};
use crate::sweep::{Plan, ProcessPairLauncher, SweepRunner, SweepSummary};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            source,
            server,
            client,
            runs,
            client_timeout,
        } => {
            let config = load_config(
                &source,
                ConfigOverrides {
                    server,
                    client,
                    runs_per_config: runs,
                    client_timeout_secs: client_timeout,
                    ..source.overrides()
                },
            )?;
            run(&config).await
        }

        Commands::Plan { source, json } => {
            let config = load_config(&source, source.overrides())?;
            let plan = SweepRunner::new(&config).plan()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
            Ok(())
        }
    }
}

fn load_config(source: &SourceArgs, overrides: ConfigOverrides) -> Result<SweepConfig> {
    let mut config = Config::load(source.config.as_deref())?;
    config.apply(overrides);
    config.into_sweep_config()
}

/// Run the sweep until it completes or Ctrl-C arrives
///
/// Interrupting drops the in-flight cycle, which kills both processes.
async fn run(config: &SweepConfig) -> Result<()> {
    let mut launcher = ProcessPairLauncher::from_config(config)?;
    tracing::info!(
        server = %launcher.server().display(),
        client = %launcher.client().display(),
        table = %config.table.display(),
        "Starting sweep"
    );

    let runner = SweepRunner::new(config);
    let summary = tokio::select! {
        result = runner.run(&mut launcher) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl+C), stopping sweep");
            return Err(Error::Interrupted);
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_plan(plan: &Plan) {
    for run in &plan.runs {
        println!(
            "{} {}",
            format!("row {} x{}:", run.row, run.repeats).cyan(),
            run.invocation
        );
    }
    for skipped in &plan.skipped {
        println!("{} {}", "skip:".yellow(), skipped.reason);
    }
}

fn print_summary(summary: &SweepSummary) {
    println!("\n{}", "Sweep finished".green().bold());
    println!("  Rows run:        {}", summary.rows_run);
    println!("  Cycles:          {}", summary.cycles);
    println!(
        "  Clients:         {} ok, {} failed, {} not started, {} timed out",
        summary.client_success.to_string().green(),
        paint_count(summary.client_failed),
        paint_count(summary.client_spawn_failed),
        paint_count(summary.client_timed_out),
    );
    if summary.servers_terminated > 0 {
        println!(
            "  Servers stopped: {}",
            summary.servers_terminated.to_string().yellow()
        );
    }
    if summary.skipped_cycles > 0 {
        println!("  Cycles skipped:  {}", paint_count(summary.skipped_cycles));
    }
    if !summary.skipped_rows.is_empty() {
        println!("  Rows skipped:    {}", paint_count(summary.skipped_rows.len()));
        for skipped in &summary.skipped_rows {
            println!("    {} {}", "✗".red(), skipped.reason.dimmed());
        }
    }
}

fn paint_count(count: usize) -> colored::ColoredString {
    if count == 0 {
        count.to_string().normal()
    } else {
        count.to_string().red()
    }
}
