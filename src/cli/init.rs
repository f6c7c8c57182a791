// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Init command - write a default configuration file

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::{generate_default_config, DEFAULT_CONFIG_FILE};

/// Run the init command
pub async fn run(force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Initializing hypoflow configuration...".bold());
    println!();

    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            DEFAULT_CONFIG_FILE
        ));
    }

    std::fs::write(path, generate_default_config())
        .map_err(|e| miette::miette!("Failed to write {}: {}", DEFAULT_CONFIG_FILE, e))?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_FILE);

    if verbose {
        println!(
            "  {} API keys are read from the environment, never from this file",
            "→".blue()
        );
    }

    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Export OPENAI_API_KEY and PERPLEXITY_API_KEY");
    println!("  2. Adjust models and ranking in {}", DEFAULT_CONFIG_FILE.cyan());
    println!("  3. Run: {}", "hypoflow run \"<your research goal>\"".cyan());

    Ok(())
}
