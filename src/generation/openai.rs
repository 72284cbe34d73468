//! OpenAI Chat Completions backend.

use super::{Backend, GenerationRequest, Generator};
use crate::error::{DistillError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based generator.
pub struct OpenAiGenerator {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build an API client authenticated with this request's credential.
    ///
    /// The client's built-in retry on rate limits and server errors is turned
    /// off: a failed call surfaces immediately.
    fn client_for(&self, request: &GenerationRequest) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(request.credential.expose())
            .with_api_base(&self.base_url);

        let no_retry = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Client::with_config(config)
            .with_http_client(self.http_client.clone())
            .with_backoff(no_retry)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn backend(&self) -> Backend {
        Backend::OpenAi
    }

    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.instruction.clone())
                .build()
                .map_err(|e| DistillError::Generation(format!("Failed to build request: {}", e)))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(|e| DistillError::Generation(format!("Failed to build request: {}", e)))?;

        let response = self
            .client_for(request)
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| DistillError::Generation(format!("OpenAI request failed: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                DistillError::MalformedResponse("OpenAI response contained no text".to_string())
            })?
            .clone();

        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Credential;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request() -> GenerationRequest {
        GenerationRequest {
            instruction: "Create an outline for the following content:\n\nchapter one".to_string(),
            credential: Credential::new("sk-test").unwrap(),
            max_tokens: 250,
            model: "gpt-4o-mini".to_string(),
        }
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop",
                "logprobs": null
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        })
    }

    async fn serve(
        status: StatusCode,
        reply: serde_json::Value,
        hits: Arc<AtomicUsize>,
    ) -> SocketAddr {
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(body): Json<serde_json::Value>| {
                let reply = reply.clone();
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(body["max_completion_tokens"], 250);
                    assert_eq!(body["messages"][0]["role"], "user");
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(StatusCode::OK, completion("1. Chapter one".into()), hits).await;
        let generator = OpenAiGenerator::new(reqwest::Client::new(), &format!("http://{}", addr));

        assert_eq!(generator.generate(&request()).await.unwrap(), "1. Chapter one");
    }

    #[tokio::test]
    async fn test_null_content_is_malformed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(StatusCode::OK, completion(serde_json::Value::Null), hits).await;
        let generator = OpenAiGenerator::new(reqwest::Client::new(), &format!("http://{}", addr));

        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, DistillError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let reply = serde_json::json!({
            "error": {"message": "The server had an error", "type": "server_error", "param": null, "code": null}
        });
        let addr = serve(StatusCode::INTERNAL_SERVER_ERROR, reply, hits.clone()).await;
        let generator = OpenAiGenerator::new(reqwest::Client::new(), &format!("http://{}", addr));

        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, DistillError::Generation(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
