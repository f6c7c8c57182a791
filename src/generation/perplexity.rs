// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Deep research over a Perplexity-style chat completions API

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::chat::{self, ChatMessage, ChatRequest, ChatResponse, StreamChunk};
use super::sse::SseParser;
use super::{ResearchFindings, ResearchService, SearchOptions};
use crate::config::{self, ResearchSettings};
use crate::errors::{HypoflowError, HypoflowResult};

const SERVICE: &str = "research";

const BASE_INSTRUCTIONS: &str = "\
Be comprehensive, thorough, factually accurate, professional and objective. \
The output is intended for a professional audience. \
Do not include any disclaimers or conversational filler.";

/// Research client returning an answer with its citations
pub struct PerplexityResearch {
    http: Client,
    url: String,
    model: String,
    api_key: String,
    instructions: String,
}

impl PerplexityResearch {
    pub fn new(settings: &ResearchSettings, api_key: impl Into<String>) -> HypoflowResult<Self> {
        Ok(Self {
            http: chat::http_client(settings.timeout_secs)?,
            url: chat::completions_url(&settings.base_url),
            model: settings.model.clone(),
            api_key: api_key.into(),
            instructions: system_instructions(settings.instructions.as_deref()),
        })
    }

    /// Build from settings, reading the API key from its environment variable
    pub fn from_settings(settings: &ResearchSettings) -> HypoflowResult<Self> {
        let api_key = config::api_key(&settings.api_key_env)?;
        Self::new(settings, api_key)
    }

    async fn search_inner(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> HypoflowResult<ResearchFindings> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(&self.instructions),
                ChatMessage::user(query),
            ],
            temperature: None,
            response_format: None,
            stream: options.streaming,
        };

        let response = chat::post(&self.http, &self.url, &self.api_key, SERVICE, &body).await?;

        if !options.streaming {
            let reply: ChatResponse = response.json().await?;
            let citations = reply.citations.clone();
            return Ok(ResearchFindings {
                content: reply.first_content(),
                citations,
            });
        }

        let mut collector = StreamCollector::default();
        let mut parser = SseParser::new();
        let mut bytes = response.bytes_stream();

        'read: while let Some(chunk) = bytes.next().await {
            for event in parser.feed(&chunk?) {
                if !collector.accept(&event) {
                    break 'read;
                }
            }
        }

        Ok(collector.finish())
    }
}

#[async_trait]
impl ResearchService for PerplexityResearch {
    async fn search(&self, query: &str, options: SearchOptions) -> HypoflowResult<ResearchFindings> {
        info!(model = %self.model, streaming = options.streaming, "Performing deep research");

        let findings = self
            .search_inner(query, options)
            .await
            .map_err(|e| HypoflowError::Research {
                message: e.to_string(),
            })?;

        info!(
            content_len = findings.content.len(),
            citations = findings.citations.len(),
            "Deep research completed"
        );
        Ok(findings)
    }
}

fn system_instructions(additional: Option<&str>) -> String {
    match additional {
        Some(extra) if !extra.trim().is_empty() => {
            format!("{}\nAdditional instructions: {}", BASE_INSTRUCTIONS, extra.trim())
        }
        _ => BASE_INSTRUCTIONS.to_string(),
    }
}

/// Accumulates a streamed answer
#[derive(Debug, Default)]
struct StreamCollector {
    content: String,
    citations: Vec<String>,
}

impl StreamCollector {
    /// Consume one event; false once the stream is done
    fn accept(&mut self, data: &str) -> bool {
        if data.trim() == "[DONE]" {
            return false;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                if let Some(text) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                {
                    self.content.push_str(&text);
                }
                // Each chunk repeats the full citation list; keep the latest
                if let Some(citations) = chunk.citations {
                    self.citations = citations;
                }
            }
            Err(e) => {
                warn!(data = %data, error = %e, "Failed to parse research SSE chunk");
            }
        }
        debug!(content_len = self.content.len(), "Research stream chunk");
        true
    }

    fn finish(self) -> ResearchFindings {
        ResearchFindings {
            content: self.content,
            citations: self.citations,
        }
    }
}
