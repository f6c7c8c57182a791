// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! OpenAI-compatible structured generation

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::chat::{self, ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use super::{strip_code_fence, Generation, GenerationRequest, GenerationService};
use crate::config::{self, GenerationSettings};
use crate::errors::{HypoflowError, HypoflowResult};

const SERVICE: &str = "generation";

/// Generation client for OpenAI and compatible servers
pub struct OpenAiGeneration {
    http: Client,
    url: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl OpenAiGeneration {
    pub fn new(settings: &GenerationSettings, api_key: impl Into<String>) -> HypoflowResult<Self> {
        Ok(Self {
            http: chat::http_client(settings.timeout_secs)?,
            url: chat::completions_url(&settings.base_url),
            model: settings.model.clone(),
            api_key: api_key.into(),
            temperature: settings.temperature,
        })
    }

    /// Build from settings, reading the API key from its environment variable
    pub fn from_settings(settings: &GenerationSettings) -> HypoflowResult<Self> {
        let api_key = config::api_key(&settings.api_key_env)?;
        Self::new(settings, api_key)
    }
}

#[async_trait]
impl GenerationService for OpenAiGeneration {
    #[instrument(skip_all, fields(role = %request.role))]
    async fn generate(&self, request: GenerationRequest) -> HypoflowResult<Generation> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(request.role.instructions()),
                ChatMessage::user(&request.prompt),
            ],
            temperature: self.temperature,
            response_format: request
                .contract
                .as_ref()
                .map(|c| ResponseFormat::json_schema(c.name, c.schema.clone())),
            stream: false,
        };

        let response = chat::post(&self.http, &self.url, &self.api_key, SERVICE, &body).await?;
        let content = response.json::<ChatResponse>().await?.first_content();
        debug!(reply_len = content.len(), "Generation reply received");

        decode_reply(&request, content)
    }
}

/// Interpret reply content according to whether a contract was requested
fn decode_reply(request: &GenerationRequest, content: String) -> HypoflowResult<Generation> {
    match &request.contract {
        None => Ok(Generation::Text(content)),
        Some(contract) => serde_json::from_str(strip_code_fence(&content))
            .map(Generation::Structured)
            .map_err(|e| {
                HypoflowError::generation(
                    request.role.name(),
                    format!("reply is not valid JSON for '{}': {}", contract.name, e),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{AgentRole, OutputContract};
    use crate::pipeline::Contract;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Score {
        score: f64,
    }

    impl Contract for Score {
        const NAME: &'static str = "score";
    }

    #[test]
    fn test_plain_request_yields_text() {
        let request = GenerationRequest::new(AgentRole::Worker, "write");
        assert_eq!(
            decode_reply(&request, "free text".into()).unwrap(),
            Generation::Text("free text".into())
        );
    }

    #[test]
    fn test_contract_request_yields_json() {
        let request = GenerationRequest::new(AgentRole::Reflection, "review")
            .with_contract(OutputContract::of::<Score>());

        assert_eq!(
            decode_reply(&request, "```json\n{\"score\": 0.5}\n```".into()).unwrap(),
            Generation::Structured(serde_json::json!({ "score": 0.5 }))
        );

        let err = decode_reply(&request, "not json".into()).unwrap_err();
        assert!(matches!(err, HypoflowError::Generation { ref role, .. } if role == "reflection"));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = GenerationSettings {
            api_key_env: "HYPOFLOW_TEST_OPENAI_KEY_UNSET".into(),
            ..GenerationSettings::default()
        };
        assert!(matches!(
            OpenAiGeneration::from_settings(&settings),
            Err(HypoflowError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_new_builds_endpoint() {
        let client = OpenAiGeneration::new(&GenerationSettings::default(), "sk-test").unwrap();
        assert_eq!(client.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(client.model, "gpt-4o");
    }
}
