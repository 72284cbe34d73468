//! Anthropic Messages API backend.

use super::{Backend, GenerationRequest, Generator};
use crate::error::{DistillError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic-based generator.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicGenerator {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Pull the first text block out of a Messages API response body.
fn parse_response(body: &str) -> Result<String> {
    let response: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        DistillError::MalformedResponse(format!("Anthropic response is not valid JSON: {}", e))
    })?;

    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            DistillError::MalformedResponse("Anthropic response contained no text".to_string())
        })
}

/// Best-effort message from an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn backend(&self) -> Backend {
        Backend::Anthropic
    }

    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let payload = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: [Message {
                role: "user",
                content: &request.instruction,
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", request.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DistillError::Generation(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DistillError::Generation(format!("Anthropic response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(DistillError::Generation(format!(
                "Anthropic API returned {}: {}",
                status,
                error_message(&body)
            )));
        }

        let text = parse_response(&body)?;
        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}
