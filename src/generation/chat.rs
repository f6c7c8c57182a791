// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! OpenAI-compatible chat completions wire types

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{HypoflowError, HypoflowResult};

// Request types
#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ResponseFormat {
    r#type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

impl ResponseFormat {
    /// Non-strict JSON schema output; strict mode rejects open schemas
    pub fn json_schema(name: &str, schema: Value) -> Self {
        Self {
            r#type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: name.to_string(),
                schema,
                strict: false,
            },
        }
    }
}

// Response types
#[derive(Deserialize, Debug)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Sources, returned by research models
    #[serde(default)]
    pub citations: Vec<String>,
}

impl ChatResponse {
    /// Content of the first choice, empty when absent
    pub fn first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct Choice {
    pub message: ReplyMessage,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub citations: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// HTTP client with a request timeout
pub(crate) fn http_client(timeout_secs: u64) -> HypoflowResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(HypoflowError::from)
}

/// `{base_url}/chat/completions`
pub(crate) fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// POST a chat request, turning non-2xx replies into errors
pub(crate) async fn post(
    http: &Client,
    url: &str,
    api_key: &str,
    service: &str,
    body: &ChatRequest<'_>,
) -> HypoflowResult<Response> {
    debug!(service, url, model = body.model, stream = body.stream, "Sending chat request");

    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        return Err(HypoflowError::HttpStatus {
            service: service.to_string(),
            status,
            body,
        });
    }

    Ok(response)
}
