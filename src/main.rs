//! Analytica - Main Entry Point

use analytica_core::cli::{self, Cli};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analytica=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(Cli::parse())
}
