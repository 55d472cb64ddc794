//! Binary entry point for the zhicuoti CLI.

#![allow(clippy::print_stderr)]

use std::io::{self, ErrorKind};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use zhicuoti::cli::{execute, load_config, Cli};
use zhicuoti::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Output piped into `head` and closed early is not a failure.
            if let Some(AppError::Io(io_err)) = e.downcast_ref::<AppError>() {
                if io_err.kind() == ErrorKind::BrokenPipe {
                    return ExitCode::SUCCESS;
                }
            }
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli).context("failed to load configuration")?;
    init_tracing(if cli.verbose { "debug" } else { config.log_level.as_str() });

    let mut stdout = io::stdout();
    execute(cli, config, &mut stdout).await?;
    Ok(())
}

/// Log to stderr so streamed text on stdout stays clean. RUST_LOG wins over
/// the configured level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
