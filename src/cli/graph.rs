// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Graph command - visualize the research workflow as a graph

use miette::Result;
use std::sync::Arc;

use super::GraphFormat;
use crate::generation::Disconnected;
use crate::pipeline::Workflow;
use crate::research::{research_workflow, ResearchOptions};

/// Run the graph command
pub async fn run(format: GraphFormat, _verbose: bool) -> Result<()> {
    // Rendering never calls the services
    let workflow = research_workflow(
        Arc::new(Disconnected),
        Arc::new(Disconnected),
        ResearchOptions::default(),
    )?;

    println!("{}", render(&workflow, format));

    Ok(())
}

fn render(workflow: &Workflow, format: GraphFormat) -> String {
    let dag = workflow.dag();
    match format {
        GraphFormat::Text => dag.to_text(workflow.plans()),
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::steps::{ADDITIONAL_RESEARCH, GENERATE_FINAL_REPORT, META_REVIEW};

    fn workflow() -> Workflow {
        research_workflow(
            Arc::new(Disconnected),
            Arc::new(Disconnected),
            ResearchOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_text_lists_gate() {
        let text = render(&workflow(), GraphFormat::Text);
        let line = text
            .lines()
            .find(|l| l.contains(ADDITIONAL_RESEARCH))
            .unwrap();
        assert!(line.contains("[when:"));
        assert!(text.lines().count() >= 10);
    }

    #[test]
    fn test_mermaid_marks_optional_edge() {
        let mermaid = render(&workflow(), GraphFormat::Mermaid);
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains(&format!("{} -.-> {}", ADDITIONAL_RESEARCH, GENERATE_FINAL_REPORT)));
        assert!(mermaid.contains(META_REVIEW));
    }
}
