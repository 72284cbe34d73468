//! Instruction composition.
//!
//! Turns a selected template plus acquired content into the single
//! instruction string sent to a generation backend.

use crate::config::Prompts;
use crate::error::{DistillError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the generated text is meant to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Natural-language text shown as-is.
    #[default]
    Summary,
    /// A chart specification rendered to an image.
    Diagram,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" | "text" => Ok(OutputMode::Summary),
            "diagram" | "chart" => Ok(OutputMode::Diagram),
            _ => Err(format!("Unknown output mode: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Summary => write!(f, "summary"),
            OutputMode::Diagram => write!(f, "diagram"),
        }
    }
}

/// Instruction templates offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemplateKey {
    #[default]
    Summary,
    KeyPoints,
    Outline,
    ActionItems,
    Questions,
    Emotions,
    Themes,
    Takeaways,
    Quotes,
    TwitterSummary,
    TlDr,
    Highlights,
    Critique,
    FactChecking,
    OpinionVsFacts,
    ActionableInsights,
    KeyDecisions,
    NextSteps,
    UnansweredQuestions,
    ControversialPoints,
    /// The user's own instruction text.
    Custom,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 21] = [
        TemplateKey::Summary,
        TemplateKey::KeyPoints,
        TemplateKey::Outline,
        TemplateKey::ActionItems,
        TemplateKey::Questions,
        TemplateKey::Emotions,
        TemplateKey::Themes,
        TemplateKey::Takeaways,
        TemplateKey::Quotes,
        TemplateKey::TwitterSummary,
        TemplateKey::TlDr,
        TemplateKey::Highlights,
        TemplateKey::Critique,
        TemplateKey::FactChecking,
        TemplateKey::OpinionVsFacts,
        TemplateKey::ActionableInsights,
        TemplateKey::KeyDecisions,
        TemplateKey::NextSteps,
        TemplateKey::UnansweredQuestions,
        TemplateKey::ControversialPoints,
        TemplateKey::Custom,
    ];

    /// Display label, also the key used in `templates.toml`.
    pub fn label(&self) -> &'static str {
        match self {
            TemplateKey::Summary => "Summary",
            TemplateKey::KeyPoints => "Key Points",
            TemplateKey::Outline => "Outline",
            TemplateKey::ActionItems => "Action Items",
            TemplateKey::Questions => "Questions",
            TemplateKey::Emotions => "Emotions",
            TemplateKey::Themes => "Themes",
            TemplateKey::Takeaways => "Takeaways",
            TemplateKey::Quotes => "Quotes",
            TemplateKey::TwitterSummary => "Summarize for Twitter",
            TemplateKey::TlDr => "TL;DR",
            TemplateKey::Highlights => "Highlights",
            TemplateKey::Critique => "Critique",
            TemplateKey::FactChecking => "Fact-checking",
            TemplateKey::OpinionVsFacts => "Opinion vs. Facts",
            TemplateKey::ActionableInsights => "Actionable Insights",
            TemplateKey::KeyDecisions => "Key Decisions",
            TemplateKey::NextSteps => "Next Steps",
            TemplateKey::UnansweredQuestions => "Unanswered Questions",
            TemplateKey::ControversialPoints => "Controversial Points",
            TemplateKey::Custom => "Custom",
        }
    }

    /// Built-in phrasing. `Custom` has none.
    pub fn default_phrase(&self) -> Option<&'static str> {
        let phrase = match self {
            TemplateKey::Summary => "Summarize the following content:",
            TemplateKey::KeyPoints => "What are the key points discussed in the following content?",
            TemplateKey::Outline => "Create an outline for the following content:",
            TemplateKey::ActionItems => {
                "Extract any action items or tasks mentioned in the following content:"
            }
            TemplateKey::Questions => {
                "What questions are raised or left unanswered in the following content?"
            }
            TemplateKey::Emotions => "Identify the dominant emotions conveyed in the following content:",
            TemplateKey::Themes => "What are the main themes or topics covered in the following content?",
            TemplateKey::Takeaways => {
                "What are the key takeaways or lessons learned from the following content?"
            }
            TemplateKey::Quotes => "Extract notable quotes or statements from the following content:",
            TemplateKey::TwitterSummary => {
                "Summarize the following content in 280 characters or less:"
            }
            TemplateKey::TlDr => {
                "Provide a brief TL;DR (too long; didn't read) summary of the following content:"
            }
            TemplateKey::Highlights => {
                "What are the highlights or most important moments in the following content?"
            }
            TemplateKey::Critique => {
                "Provide a constructive critique of the ideas in the following content:"
            }
            TemplateKey::FactChecking => {
                "Identify any statements in the following content that may require fact-checking:"
            }
            TemplateKey::OpinionVsFacts => {
                "Distinguish between opinions and facts presented in the following content:"
            }
            TemplateKey::ActionableInsights => {
                "What actionable insights can be derived from the following content?"
            }
            TemplateKey::KeyDecisions => {
                "What key decisions or conclusions are made in the following content?"
            }
            TemplateKey::NextSteps => {
                "Based on the following content, what should be the next steps or actions?"
            }
            TemplateKey::UnansweredQuestions => {
                "What questions or issues are left unresolved in the following content?"
            }
            TemplateKey::ControversialPoints => {
                "Identify any controversial or debatable points mentioned in the following content:"
            }
            TemplateKey::Custom => return None,
        };
        Some(phrase)
    }
}

/// Lowercase and keep only letters and digits, so "Key Points",
/// "key-points" and "key_points" compare equal.
fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl std::str::FromStr for TemplateKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        if wanted == "twitter" {
            return Ok(TemplateKey::TwitterSummary);
        }
        TemplateKey::ALL
            .into_iter()
            .find(|key| normalize_key(key.label()) == wanted)
            .ok_or_else(|| format!("Unknown template: {}", s))
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for TemplateKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemplateKey> for String {
    fn from(key: TemplateKey) -> Self {
        key.label().to_string()
    }
}

/// Builds instructions from templates and content.
#[derive(Debug, Clone)]
pub struct Composer {
    prompts: Prompts,
    length_hint: bool,
}

impl Composer {
    pub fn new(prompts: Prompts, length_hint: bool) -> Self {
        Self {
            prompts,
            length_hint,
        }
    }

    /// Phrasing for a template: config override, built-in text, or the
    /// user's custom text.
    pub fn phrase(&self, template: TemplateKey, custom_text: Option<&str>) -> Result<String> {
        if template == TemplateKey::Custom {
            return custom_text
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    DistillError::InvalidInput(
                        "The Custom template needs a non-empty custom prompt".to_string(),
                    )
                });
        }

        let phrase = self
            .prompts
            .template_override(template.label())
            .or_else(|| template.default_phrase())
            .unwrap_or_default();
        Ok(phrase.to_string())
    }

    /// Compose the full instruction for one run.
    ///
    /// Summary mode: `phrase + "\n\n" + content`, plus an optional length hint.
    /// Diagram mode: the diagram instruction with the phrase as its focus,
    /// followed by the content.
    pub fn compose(
        &self,
        content: &str,
        template: TemplateKey,
        custom_text: Option<&str>,
        mode: OutputMode,
        max_tokens: u32,
    ) -> Result<String> {
        let phrase = self.phrase(template, custom_text)?;

        let instruction = match mode {
            OutputMode::Summary => {
                let mut instruction = format!("{}\n\n{}", phrase, content);
                if self.length_hint {
                    let mut vars = HashMap::new();
                    vars.insert("max_tokens".to_string(), max_tokens.to_string());
                    let hint = self.prompts.render_with_custom(&self.prompts.length.hint, &vars);
                    instruction.push_str("\n\n");
                    instruction.push_str(&hint);
                }
                instruction
            }
            OutputMode::Diagram => {
                let mut vars = HashMap::new();
                vars.insert("focus".to_string(), phrase);
                let meta = self
                    .prompts
                    .render_with_custom(&self.prompts.diagram.instruction, &vars);
                format!("{}\n\nContent:\n{}", meta, content)
            }
        };

        Ok(instruction)
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(Prompts::default(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_round_trip() {
        let composer = Composer::default();
        let instruction = composer
            .compose("hello world", TemplateKey::Summary, None, OutputMode::Summary, 1000)
            .unwrap();

        assert!(instruction.starts_with("Summarize the following content:\n\nhello world"));
        assert!(instruction.contains("hello world"));
        assert!(instruction.contains("1000 tokens"));
    }

    #[test]
    fn test_length_hint_can_be_disabled() {
        let composer = Composer::new(Prompts::default(), false);
        let instruction = composer
            .compose("hello world", TemplateKey::Summary, None, OutputMode::Summary, 1000)
            .unwrap();
        assert_eq!(instruction, "Summarize the following content:\n\nhello world");
    }

    #[test]
    fn test_every_template_contains_phrase_and_content() {
        let composer = Composer::default();
        let content = "Line one.\n  Line two with  spacing.";

        for template in TemplateKey::ALL {
            let custom = (template == TemplateKey::Custom).then_some("List every name mentioned:");
            let phrase = composer.phrase(template, custom).unwrap();

            for mode in [OutputMode::Summary, OutputMode::Diagram] {
                let instruction = composer
                    .compose(content, template, custom, mode, 500)
                    .unwrap();
                assert!(instruction.contains(&phrase), "{} / {}", template, mode);
                assert!(instruction.contains(content), "{} / {}", template, mode);
            }
        }
    }

    #[test]
    fn test_diagram_mode_uses_meta_instruction() {
        let composer = Composer::default();
        let instruction = composer
            .compose("sales rose", TemplateKey::Themes, None, OutputMode::Diagram, 800)
            .unwrap();

        assert!(instruction.contains("Output only the JSON object"));
        assert!(instruction.contains(
            "Focus: What are the main themes or topics covered in the following content?"
        ));
        assert!(!instruction.contains("{{focus}}"));
        assert!(!instruction.contains("800 tokens"));
    }

    #[test]
    fn test_custom_requires_text() {
        let composer = Composer::default();
        for custom in [None, Some(""), Some("   ")] {
            let err = composer
                .compose("x", TemplateKey::Custom, custom, OutputMode::Summary, 100)
                .unwrap_err();
            assert!(matches!(err, DistillError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_config_override_replaces_phrase() {
        let mut prompts = Prompts::default();
        prompts
            .templates
            .insert("Outline".to_string(), "Outline this as nested bullets:".to_string());
        let composer = Composer::new(prompts, false);

        let instruction = composer
            .compose("body", TemplateKey::Outline, None, OutputMode::Summary, 100)
            .unwrap();
        assert_eq!(instruction, "Outline this as nested bullets:\n\nbody");
    }

    #[test]
    fn test_template_key_parsing() {
        assert_eq!("Key Points".parse::<TemplateKey>(), Ok(TemplateKey::KeyPoints));
        assert_eq!("key-points".parse::<TemplateKey>(), Ok(TemplateKey::KeyPoints));
        assert_eq!("tl-dr".parse::<TemplateKey>(), Ok(TemplateKey::TlDr));
        assert_eq!("TL;DR".parse::<TemplateKey>(), Ok(TemplateKey::TlDr));
        assert_eq!("opinion_vs_facts".parse::<TemplateKey>(), Ok(TemplateKey::OpinionVsFacts));
        assert_eq!("twitter".parse::<TemplateKey>(), Ok(TemplateKey::TwitterSummary));
        assert!("haiku".parse::<TemplateKey>().is_err());

        for key in TemplateKey::ALL {
            assert_eq!(key.label().parse::<TemplateKey>(), Ok(key));
        }
    }

    #[test]
    fn test_fixed_templates_have_phrases() {
        for key in TemplateKey::ALL {
            assert_eq!(key.default_phrase().is_none(), key == TemplateKey::Custom);
        }
    }
}
