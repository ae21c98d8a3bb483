//! kpiwatch CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kpi_cli::cli::{Cli, Commands};
use kpi_cli::commands::{CheckCommand, DatesCommand, ExtractCommand, check::build_sink};
use kpi_cli::config::Config;
use kpi_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_file(&cli.config)?;
    let format = OutputFormat::new(cli.format);
    let now = config.now()?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Extract => {
            ExtractCommand::new(&config).execute(&mut stdout, &format, now)?;
        }
        Commands::Dates { sheet } => {
            DatesCommand::new(&config).execute(&mut stdout, &format, &sheet)?;
        }
        Commands::CheckMissing => {
            let sink = build_sink(&config)?;
            CheckCommand::new(&config, sink.as_ref(), cli.dry_run).missing(&mut stdout, &format, now)?;
        }
        Commands::CheckBelowAverage => {
            let sink = build_sink(&config)?;
            CheckCommand::new(&config, sink.as_ref(), cli.dry_run).below_average(&mut stdout, &format, now)?;
        }
        Commands::CheckFollowup => {
            let sink = build_sink(&config)?;
            CheckCommand::new(&config, sink.as_ref(), cli.dry_run).followup(&mut stdout, &format, now)?;
        }
    }

    Ok(())
}
