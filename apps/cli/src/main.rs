//! pipelens CLI: recruiting-pipeline metrics from CRM exports.
//!
//! Loads a CSV export, applies company and month filters, and prints
//! per-company metrics, funnel, alerts, and recommendations.

mod commands;
mod render;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
