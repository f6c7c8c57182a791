// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Generation and research service adapters
//!
//! Steps talk to external reasoning services only through the
//! [`GenerationService`] and [`ResearchService`] traits. Concrete adapters
//! speak the OpenAI-compatible chat completions protocol; the stubs drive
//! the workflow in tests.

mod chat;
mod openai;
mod perplexity;
mod roles;
mod sse;
mod stub;

pub use openai::OpenAiGeneration;
pub use perplexity::PerplexityResearch;
pub use roles::AgentRole;
pub use sse::SseParser;
pub use stub::{StubGeneration, StubResearch};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{HypoflowError, HypoflowResult};
use crate::pipeline::contract::{self, Contract};

/// Expected shape of a structured reply
#[derive(Debug, Clone, PartialEq)]
pub struct OutputContract {
    pub name: &'static str,
    pub schema: Value,
}

impl OutputContract {
    pub fn of<T: Contract>() -> Self {
        Self {
            name: T::NAME,
            schema: T::schema(),
        }
    }
}

/// A single request to the generation service
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub role: AgentRole,
    pub prompt: String,
    pub contract: Option<OutputContract>,
}

impl GenerationRequest {
    pub fn new(role: AgentRole, prompt: impl Into<String>) -> Self {
        Self {
            role,
            prompt: prompt.into(),
            contract: None,
        }
    }

    /// Ask for a reply matching a contract
    pub fn with_contract(mut self, contract: OutputContract) -> Self {
        self.contract = Some(contract);
        self
    }
}

/// Reply from the generation service
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Text(String),
    Structured(Value),
}

/// Structured-generation capability
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> HypoflowResult<Generation>;
}

/// Options for a research query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub streaming: bool,
}

/// Research answer with its sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub content: String,
    pub citations: Vec<String>,
}

impl ResearchFindings {
    /// Content followed by numbered citations, one `[i] source` block each
    pub fn with_citations(&self) -> String {
        let mut text = self.content.clone();
        for (i, citation) in self.citations.iter().enumerate() {
            text.push_str(&format!("\n\n[{}] {}", i + 1, citation));
        }
        text
    }
}

/// Web research capability
#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn search(&self, query: &str, options: SearchOptions) -> HypoflowResult<ResearchFindings>;
}

/// Ask for a structured reply and decode it into `T`
///
/// Services that cannot return structured output may answer with JSON text,
/// optionally wrapped in a Markdown code fence.
pub async fn generate_as<T: Contract>(
    service: &dyn GenerationService,
    role: AgentRole,
    prompt: impl Into<String>,
) -> HypoflowResult<T> {
    let request = GenerationRequest::new(role, prompt).with_contract(OutputContract::of::<T>());
    let value = match service.generate(request).await? {
        Generation::Structured(value) => value,
        Generation::Text(text) => serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| HypoflowError::contract(T::NAME, e))?,
    };
    contract::decode(value)
}

/// Remove a surrounding ```json fence, if any
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    match inner.find('\n') {
        Some(newline) if !inner[..newline].contains('{') => inner[newline + 1..].trim(),
        _ => inner.trim(),
    }
}

/// Placeholder services for building a workflow that will never run
pub struct Disconnected;

#[async_trait]
impl GenerationService for Disconnected {
    async fn generate(&self, request: GenerationRequest) -> HypoflowResult<Generation> {
        Err(HypoflowError::generation(
            request.role.name(),
            "no generation service configured",
        ))
    }
}

#[async_trait]
impl ResearchService for Disconnected {
    async fn search(&self, _query: &str, _options: SearchOptions) -> HypoflowResult<ResearchFindings> {
        Err(HypoflowError::Research {
            message: "no research service configured".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Answer {
        answer: u32,
    }

    impl Contract for Answer {
        const NAME: &'static str = "answer";

        fn validate(&self) -> Result<(), String> {
            if self.answer > 100 {
                Err("answer too large".into())
            } else {
                Ok(())
            }
        }
    }

    fn replying(reply: Generation) -> StubGeneration {
        StubGeneration::new(move |_| Ok(reply.clone()))
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_findings_with_citations() {
        let findings = ResearchFindings {
            content: "Body".into(),
            citations: vec!["https://a.example".into(), "https://b.example".into()],
        };
        assert_eq!(
            findings.with_citations(),
            "Body\n\n[1] https://a.example\n\n[2] https://b.example"
        );
    }

    #[tokio::test]
    async fn test_generate_as_structured() {
        let stub = replying(Generation::Structured(serde_json::json!({ "answer": 42 })));
        let answer: Answer = generate_as(&stub, AgentRole::Worker, "q").await.unwrap();
        assert_eq!(answer, Answer { answer: 42 });

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].contract.as_ref().map(|c| c.name), Some("answer"));
    }

    #[tokio::test]
    async fn test_generate_as_fenced_text() {
        let stub = replying(Generation::Text("```json\n{\"answer\": 7}\n```".into()));
        let answer: Answer = generate_as(&stub, AgentRole::Worker, "q").await.unwrap();
        assert_eq!(answer.answer, 7);
    }

    #[tokio::test]
    async fn test_generate_as_rejects_invalid_replies() {
        let prose = replying(Generation::Text("I think the answer is 42".into()));
        let err = generate_as::<Answer>(&prose, AgentRole::Worker, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, HypoflowError::ContractViolation { .. }));

        let out_of_range = replying(Generation::Structured(serde_json::json!({ "answer": 400 })));
        let err = generate_as::<Answer>(&out_of_range, AgentRole::Worker, "q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("answer too large"));
    }

    #[tokio::test]
    async fn test_disconnected_services_fail() {
        let generation: &dyn GenerationService = &Disconnected;
        assert!(generation
            .generate(GenerationRequest::new(AgentRole::Worker, "q"))
            .await
            .is_err());

        let research: &dyn ResearchService = &Disconnected;
        assert!(research.search("q", SearchOptions::default()).await.is_err());
    }
}
