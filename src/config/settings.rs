//! Configuration settings for Distill.

use crate::generation::Backend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser user agent sent with page requests. Many sites refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Lower bound for the output-length option.
pub const MIN_MAX_TOKENS: u32 = 100;

/// Upper bound for the output-length option.
pub const MAX_MAX_TOKENS: u32 = 4000;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub video: VideoSettings,
    pub output: OutputSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Timeout applied to every outbound HTTP request.
    pub request_timeout_secs: u64,
    /// User agent for page and robots.txt requests.
    pub user_agent: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            request_timeout_secs: 300,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Backend used when none is given on the command line.
    pub backend: Backend,
    /// Anthropic model identifier.
    pub anthropic_model: String,
    /// OpenAI model identifier.
    pub openai_model: String,
    /// Default output-token bound.
    pub max_tokens: u32,
    /// Base URL of the Anthropic API.
    pub anthropic_base_url: String,
    /// Base URL of the OpenAI API.
    pub openai_base_url: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Anthropic,
            anthropic_model: Backend::Anthropic.default_model().to_string(),
            openai_model: Backend::OpenAi.default_model().to_string(),
            max_tokens: 1000,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl GenerationSettings {
    /// Configured model for a backend.
    pub fn model_for(&self, backend: Backend) -> &str {
        match backend {
            Backend::Anthropic => &self.anthropic_model,
            Backend::OpenAi => &self.openai_model,
        }
    }
}

/// Video transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Path or name of the yt-dlp binary.
    pub yt_dlp_path: String,
    /// Caption languages to accept, in order of preference.
    pub languages: Vec<String>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string()],
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Where diagram-mode charts are written.
    pub chart_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            chart_path: "chart.svg".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Append a target-length hint to summary instructions.
    pub length_hint: bool,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            custom_dir: None,
            length_hint: true,
            variables: std::collections::HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DistillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("distill")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded chart output path.
    pub fn chart_path(&self) -> PathBuf {
        Self::expand_path(&self.output.chart_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(settings.generation.backend, Backend::Anthropic);
        assert_eq!(settings.generation.max_tokens, 1000);
        assert!(settings.prompts.length_hint);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[generation]\nbackend = \"openai\"\nopenai_model = \"gpt-4.1\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.generation.backend, Backend::OpenAi);
        assert_eq!(settings.generation.model_for(Backend::OpenAi), "gpt-4.1");
        assert_eq!(
            settings.generation.model_for(Backend::Anthropic),
            "claude-3-haiku-20240307"
        );
        assert_eq!(settings.video.languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.output.chart_path = "out/diagram.svg".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.output.chart_path, "out/diagram.svg");
    }
}
