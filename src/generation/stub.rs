// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! In-process service doubles
//!
//! Used by tests and offline dry runs. Both record how they were called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    AgentRole, Generation, GenerationRequest, GenerationService, ResearchFindings,
    ResearchService, SearchOptions,
};
use crate::errors::{HypoflowError, HypoflowResult};

type Responder = dyn Fn(&GenerationRequest) -> HypoflowResult<Generation> + Send + Sync;

/// Generation service answering from a closure
pub struct StubGeneration {
    responder: Arc<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StubGeneration {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> HypoflowResult<Generation> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of requests made under a role
    pub fn calls_for(&self, role: AgentRole) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|r| r.role == role)
            .count()
    }
}

#[async_trait]
impl GenerationService for StubGeneration {
    async fn generate(&self, request: GenerationRequest) -> HypoflowResult<Generation> {
        let reply = (self.responder)(&request);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        reply
    }
}

/// Research service returning fixed findings, or a fixed failure
pub struct StubResearch {
    outcome: Result<ResearchFindings, String>,
    queries: Mutex<Vec<(String, SearchOptions)>>,
    calls: AtomicUsize,
}

impl StubResearch {
    pub fn new(findings: ResearchFindings) -> Self {
        Self {
            outcome: Ok(findings),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received so far, with their options
    pub fn queries(&self) -> Vec<(String, SearchOptions)> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ResearchService for StubResearch {
    async fn search(&self, query: &str, options: SearchOptions) -> HypoflowResult<ResearchFindings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((query.to_string(), options));

        self.outcome
            .clone()
            .map_err(|message| HypoflowError::Research { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_generation_records_requests() {
        let stub = StubGeneration::new(|request| Ok(Generation::Text(request.prompt.to_uppercase())));

        let reply = stub
            .generate(GenerationRequest::new(AgentRole::Worker, "hello"))
            .await
            .unwrap();
        assert_eq!(reply, Generation::Text("HELLO".into()));
        assert_eq!(stub.calls_for(AgentRole::Worker), 1);
        assert_eq!(stub.calls_for(AgentRole::Ranking), 0);
    }

    #[tokio::test]
    async fn test_stub_research() {
        let ok = StubResearch::new(ResearchFindings {
            content: "found".into(),
            citations: vec![],
        });
        let options = SearchOptions { streaming: true };
        assert_eq!(ok.search("q", options).await.unwrap().content, "found");
        assert_eq!(ok.calls(), 1);
        assert_eq!(ok.queries(), vec![("q".to_string(), options)]);

        let failing = StubResearch::failing("quota exceeded");
        let err = failing.search("q", SearchOptions::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Error performing deep research: quota exceeded");
    }
}
