use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use schedviz_cli::commands::{correct, intervals, pick};
use schedviz_cli::{Cli, Commands, Config, LoadedTrace, trace_file};

/// Load config and the trace dump.
fn open_trace(config_path: Option<&Path>, trace: &Path) -> Result<(LoadedTrace, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let trace = trace_file::load(trace)?;
    tracing::debug!(entries = trace.store.len(), "trace loaded");
    Ok((trace, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Correct { trace, json }) => {
            let (mut trace, _config) = open_trace(cli.config.as_deref(), trace)?;
            correct::run(&mut stdout, &mut trace, *json)?;
        }
        Some(Commands::Intervals { view, json }) => {
            let (mut trace, config) = open_trace(cli.config.as_deref(), &view.trace)?;
            intervals::run(
                &mut stdout,
                &mut trace,
                &config,
                view.pid,
                (view.min, view.max),
                *json,
            )?;
        }
        Some(Commands::Pick { view, x, y }) => {
            let (mut trace, config) = open_trace(cli.config.as_deref(), &view.trace)?;
            pick::run(
                &mut stdout,
                &mut trace,
                &config,
                view.pid,
                (view.min, view.max),
                (*x, *y),
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
