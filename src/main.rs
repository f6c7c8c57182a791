// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! hypoflow - Research Hypothesis Workflow Orchestrator
//!
//! Generate, review, rank, evolve and report hypotheses for a research goal.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hypoflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs share stderr with progress; stdout carries the report
    let default_filter = if cli.verbose { "hypoflow=info" } else { "hypoflow=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Init { force } => hypoflow::cli::init::run(force, cli.verbose).await,
        Commands::Run {
            goal,
            preferences,
            config,
            output,
            format,
        } => hypoflow::cli::run::run(goal, preferences, config, output, format, cli.verbose).await,
        Commands::Graph { format } => hypoflow::cli::graph::run(format, cli.verbose).await,
    }
}
