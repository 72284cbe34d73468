//! Per-run form state.
//!
//! A `Session` holds every choice the user made for one run. It is built by
//! the CLI from flags, or deserialized from the browser form's JSON body.

use crate::compose::{OutputMode, TemplateKey};
use crate::config::{Settings, MAX_MAX_TOKENS, MIN_MAX_TOKENS};
use crate::error::{DistillError, Result};
use crate::generation::{Backend, Credential};
use crate::source::SourceKind;
use serde::{Deserialize, Deserializer};

/// Everything needed to run the pipeline once.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// Explicit source kind; detected from the locator when absent.
    #[serde(default)]
    pub source: Option<SourceKind>,
    /// Video URL/ID or page URL.
    pub locator: String,
    #[serde(default)]
    pub template: TemplateKey,
    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub mode: OutputMode,
    /// Falls back to `generation.backend`.
    #[serde(default)]
    pub backend: Option<Backend>,
    /// Falls back to the backend's configured model.
    #[serde(default)]
    pub model: Option<String>,
    /// Falls back to `generation.max_tokens`.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default, rename = "api_key", deserialize_with = "deserialize_credential")]
    pub credential: Option<Credential>,
}

fn deserialize_credential<'de, D>(deserializer: D) -> std::result::Result<Option<Credential>, D::Error>
where
    D: Deserializer<'de>,
{
    let key: Option<String> = Option::deserialize(deserializer)?;
    Ok(key.and_then(Credential::new))
}

impl Session {
    /// A session with default choices for the given locator.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            source: None,
            locator: locator.into(),
            template: TemplateKey::default(),
            custom_prompt: None,
            mode: OutputMode::default(),
            backend: None,
            model: None,
            max_tokens: None,
            credential: None,
        }
    }

    /// Backend for this run.
    pub fn backend(&self, settings: &Settings) -> Backend {
        self.backend.unwrap_or(settings.generation.backend)
    }

    /// Model for this run.
    pub fn model(&self, settings: &Settings) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| settings.generation.model_for(self.backend(settings)))
            .to_string()
    }

    /// Output-token bound for this run.
    pub fn max_tokens(&self, settings: &Settings) -> u32 {
        self.max_tokens.unwrap_or(settings.generation.max_tokens)
    }

    /// Fill in the credential from the backend's environment variable if none was given.
    pub fn with_env_credential(mut self, settings: &Settings) -> Self {
        if self.credential.is_none() {
            self.credential = std::env::var(self.backend(settings).env_var())
                .ok()
                .and_then(Credential::new);
        }
        self
    }

    /// Reject choices that can never produce a run. Performs no I/O.
    pub fn validate(&self, settings: &Settings) -> Result<()> {
        if self.locator.trim().is_empty() {
            return Err(DistillError::InvalidInput(
                "A video URL or page URL is required".to_string(),
            ));
        }

        let max_tokens = self.max_tokens(settings);
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&max_tokens) {
            return Err(DistillError::InvalidInput(format!(
                "max tokens must be between {} and {}, got {}",
                MIN_MAX_TOKENS, MAX_MAX_TOKENS, max_tokens
            )));
        }

        if self.template == TemplateKey::Custom
            && self
                .custom_prompt
                .as_deref()
                .map_or(true, |text| text.trim().is_empty())
        {
            return Err(DistillError::InvalidInput(
                "The Custom template needs a non-empty custom prompt".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_settings() {
        let mut settings = Settings::default();
        settings.generation.backend = Backend::OpenAi;
        settings.generation.openai_model = "gpt-4.1-mini".to_string();
        settings.generation.max_tokens = 700;

        let session = Session::new("https://example.com");
        assert_eq!(session.backend(&settings), Backend::OpenAi);
        assert_eq!(session.model(&settings), "gpt-4.1-mini");
        assert_eq!(session.max_tokens(&settings), 700);

        let mut session = session;
        session.backend = Some(Backend::Anthropic);
        session.model = Some("  ".to_string());
        assert_eq!(
            session.model(&settings),
            settings.generation.anthropic_model
        );
    }

    #[test]
    fn test_validate_max_tokens_range() {
        let settings = Settings::default();
        let mut session = Session::new("dQw4w9WgXcQ");
        for (value, ok) in [(99, false), (100, true), (4000, true), (4001, false)] {
            session.max_tokens = Some(value);
            assert_eq!(session.validate(&settings).is_ok(), ok, "{}", value);
        }
    }

    #[test]
    fn test_validate_custom_and_locator() {
        let settings = Settings::default();

        let mut session = Session::new("https://example.com");
        session.template = TemplateKey::Custom;
        session.custom_prompt = Some("   ".to_string());
        assert!(matches!(
            session.validate(&settings),
            Err(DistillError::InvalidInput(_))
        ));
        session.custom_prompt = Some("List every book mentioned".to_string());
        assert!(session.validate(&settings).is_ok());

        assert!(Session::new("  ").validate(&settings).is_err());
    }

    #[test]
    fn test_deserialize_form_body() {
        let body = r#"{
            "locator": "https://example.com/post",
            "source": "page",
            "template": "key-points",
            "mode": "diagram",
            "backend": "openai",
            "max_tokens": 500,
            "api_key": "sk-form"
        }"#;
        let session: Session = serde_json::from_str(body).unwrap();
        assert_eq!(session.source, Some(SourceKind::Page));
        assert_eq!(session.template, TemplateKey::KeyPoints);
        assert_eq!(session.mode, OutputMode::Diagram);
        assert_eq!(session.backend, Some(Backend::OpenAi));
        assert_eq!(session.credential.as_ref().map(|c| c.expose()), Some("sk-form"));
        assert!(!format!("{:?}", session).contains("sk-form"));

        let session: Session =
            serde_json::from_str(r#"{"locator": "dQw4w9WgXcQ", "api_key": ""}"#).unwrap();
        assert!(session.credential.is_none());
        assert_eq!(session.template, TemplateKey::Summary);
    }
}
