//! Text generation backends.
//!
//! Each backend sends one composed instruction to a remote LLM service and
//! returns the first text it produces. Nothing is retried.

mod anthropic;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiGenerator;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Anthropic Messages API.
    #[default]
    Anthropic,
    /// OpenAI Chat Completions API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Anthropic, Backend::OpenAi];

    /// Model used when neither the run nor the config names one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::Anthropic => "claude-3-haiku-20240307",
            Backend::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variable holding this backend's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Backend::Anthropic => "ANTHROPIC_API_KEY",
            Backend::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Anthropic => "Anthropic",
            Backend::OpenAi => "OpenAI",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Backend::Anthropic),
            "openai" | "gpt" => Ok(Backend::OpenAi),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Anthropic => write!(f, "anthropic"),
            Backend::OpenAi => write!(f, "openai"),
        }
    }
}

/// An API key. Never printed, logged or serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, rejecting empty or whitespace-only values.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    /// The secret itself, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One request to a generation backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub credential: Credential,
    pub max_tokens: u32,
    pub model: String,
}

/// Trait for generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Which provider this is.
    fn backend(&self) -> Backend;

    /// Send the instruction and return the generated text.
    ///
    /// A successful result is never empty: an empty or oddly shaped reply is
    /// `MalformedResponse`, and transport or authentication failures are
    /// `Generation`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_is_redacted() {
        let credential = Credential::new("sk-secret-value").unwrap();
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.expose(), "sk-secret-value");

        let request = GenerationRequest {
            instruction: "Summarize".to_string(),
            credential,
            max_tokens: 100,
            model: "m".to_string(),
        };
        assert!(!format!("{:?}", request).contains("sk-secret-value"));
    }

    #[test]
    fn test_blank_credential_rejected() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" key ").unwrap().expose(), "key");
    }

    #[test]
    fn test_backend_parsing_and_serde() {
        assert_eq!("OpenAI".parse::<Backend>(), Ok(Backend::OpenAi));
        assert_eq!("claude".parse::<Backend>(), Ok(Backend::Anthropic));
        assert!("llama".parse::<Backend>().is_err());

        assert_eq!(serde_json::to_string(&Backend::OpenAi).unwrap(), "\"openai\"");
        let parsed: Backend = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, Backend::Anthropic);
    }
}
