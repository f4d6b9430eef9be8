//! Media Bridge command-line front end.
//!
//! Drives the same channel handlers the host application uses, so
//! extraction and cover caching can be exercised from a shell.

use clap::Parser;
use media_bridge::cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("media_bridge=info".parse()?))
        .init();

    cli::run_command(&args)
}
