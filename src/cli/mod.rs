// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for hypoflow.

pub mod graph;
pub mod init;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Research hypothesis workflow orchestrator
///
/// Turn a research goal into ranked, evolved and reported hypotheses.
#[derive(Parser, Debug)]
#[clap(
    name = "hypoflow",
    version,
    about = "Research workflow orchestrator: generate, review, rank, evolve and report hypotheses",
    long_about = None,
    after_help = "Examples:\n\
        hypoflow init                              Write a default .hypoflow.yaml\n\
        hypoflow run \"Reduce ALS progression\"      Run the research workflow\n\
        hypoflow graph --format mermaid            Show the workflow graph\n\n\
        See 'hypoflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[clap(short, long)]
        force: bool,
    },

    /// Run the research workflow for a goal
    Run {
        /// Research goal in natural language
        goal: String,

        /// Evaluation preferences for the hypotheses
        #[clap(short, long)]
        preferences: Option<String>,

        /// Configuration file (default: search .hypoflow.yaml, then the user config dir)
        #[clap(short, long)]
        config: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Output format: text or json
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the research workflow as a graph
    Graph {
        /// Output format: text, dot or mermaid
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },
}

/// Output format for the run command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}
