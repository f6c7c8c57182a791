// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Run command - execute the research workflow for a goal

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::OutputFormat;
use crate::config::Settings;
use crate::errors::{HypoflowError, RecoverySuggestion};
use crate::generation::{OpenAiGeneration, PerplexityResearch};
use crate::pipeline::Trigger;
use crate::research::steps::GENERATE_FINAL_REPORT;
use crate::research::{research_workflow, FinalReport, ResearchOptions};
use crate::utils::StepProgress;

/// Run the research workflow
pub async fn run(
    goal: String,
    preferences: Option<String>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let settings = Settings::load(config.as_deref()).map_err(report)?;

    let generation = OpenAiGeneration::from_settings(&settings.generation).map_err(report)?;
    let research = PerplexityResearch::from_settings(&settings.research).map_err(report)?;

    let workflow = research_workflow(
        Arc::new(generation),
        Arc::new(research),
        ResearchOptions::from_settings(&settings),
    )?;

    let mut trigger = Trigger::new(goal);
    if let Some(preferences) = preferences {
        trigger = trigger.with_preferences(preferences);
    }

    eprintln!("{} {}", "Researching:".bold(), trigger.goal);
    if verbose {
        eprintln!(
            "  {} generation: {}, research: {}",
            "→".blue(),
            settings.generation.model,
            settings.research.model
        );
    }
    eprintln!();

    let progress = StepProgress::new();
    let result = workflow
        .run_with(trigger, &progress)
        .await
        .map_err(report)?;

    let final_report: FinalReport = result.output(GENERATE_FINAL_REPORT)?;

    eprintln!();
    let executed = result.executed().len();
    eprintln!(
        "{} {} steps run, {} skipped in {:.1}s",
        "✓".green(),
        executed,
        result.steps.len() - executed,
        result.duration.as_secs_f64()
    );

    let rendered = match format {
        OutputFormat::Text => final_report.final_report.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&final_report)
            .map_err(|e| miette::miette!("Failed to serialize report: {}", e))?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                miette::miette!("Failed to write '{}': {}", path.display(), e)
            })?;
            eprintln!("  {} Report written to {}", "→".blue(), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Print a recovery hint, then hand the error to miette
fn report(error: HypoflowError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!("{}", suggestion.to_string().yellow());
    }
    error.into()
}
