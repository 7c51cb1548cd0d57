mod args;
mod commands;

use anyhow::Context;
use clap::Parser;
use common::utils::config::get_config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = get_config().context("failed to load configuration")?;

    commands::run(cli.command, config).await
}
