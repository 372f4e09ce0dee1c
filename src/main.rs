//! Binary entry point for lexrag.
//!
//! Standalone runner over the in-process backends. Exit code 0 on
//! success, 1 on startup or command failure.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::Context as _;
use clap::Parser;
use lexrag::cli::{Cli, execute};
use std::io::{self, Write};
use std::process::ExitCode;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Runtime::new().context("could not start async runtime")?;
    let output = runtime
        .block_on(execute(cli))
        .context("command execution failed")?;
    Ok(output)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                // Handle broken pipe gracefully (e.g., when piped to `head`)
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
