//! Prompt templates for Distill.
//!
//! Template phrasings can be customized by placing a `templates.toml` file in
//! the custom prompts directory. Keys are template labels ("Key Points") and
//! values replace the built-in phrasing. A `diagram.toml` file may replace the
//! diagram instruction.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\{\{([\w.-]+)\}\}").expect("Invalid regex"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Phrasing overrides keyed by template label.
    pub templates: HashMap<String, String>,
    pub diagram: DiagramPrompts,
    pub length: LengthPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for diagram mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramPrompts {
    /// Meta-instruction asking for a chart specification. `{{focus}}` receives
    /// the phrasing of the selected template.
    pub instruction: String,
}

impl Default for DiagramPrompts {
    fn default() -> Self {
        Self {
            instruction: r#"You are a data visualization assistant. Read the content below and design one chart that best illustrates it.

Focus: {{focus}}

Respond with a single JSON object describing the chart, with all data inline. Use this shape:
{"chart_type": "bar" | "line" | "pie", "title": "...", "x_label": "...", "y_label": "...", "labels": ["..."], "series": [{"name": "...", "values": [1.0]}]}

## Rules
- Every series must have exactly one numeric value per label
- A pie chart has exactly one series of non-negative values
- Do not reference external files, URLs or datasets
- Output only the JSON object: begin with { and end with }
- No explanations, no surrounding text, no code fences"#
                .to_string(),
        }
    }
}

/// Prompt used to hint at the desired output length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthPrompts {
    pub hint: String,
}

impl Default for LengthPrompts {
    fn default() -> Self {
        Self {
            hint: "Keep your response to roughly {{max_tokens}} tokens or fewer.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let templates_path = custom_path.join("templates.toml");
            if templates_path.exists() {
                let content = std::fs::read_to_string(&templates_path)?;
                prompts.templates = toml::from_str(&content)?;
            }

            let diagram_path = custom_path.join("diagram.toml");
            if diagram_path.exists() {
                let content = std::fs::read_to_string(&diagram_path)?;
                prompts.diagram = toml::from_str(&content)?;
            }

            let length_path = custom_path.join("length.toml");
            if length_path.exists() {
                let content = std::fs::read_to_string(&length_path)?;
                prompts.length = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Look up a phrasing override by template label (case-insensitive).
    pub fn template_override(&self, label: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(label))
            .map(|(_, value)| value.as_str())
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template: inserted values are
    /// never expanded again, and unknown placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.diagram.instruction.contains("{{focus}}"));
        assert!(prompts.length.hint.contains("{{max_tokens}}"));
        assert!(prompts.templates.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_inserted_values_are_not_expanded_again() {
        let mut vars = HashMap::new();
        vars.insert("focus".to_string(), "the {{audience}} angle".to_string());
        vars.insert("audience".to_string(), "engineers".to_string());

        for _ in 0..8 {
            let result = Prompts::render("Focus: {{focus}} for {{audience}}. {{unknown}}", &vars);
            assert_eq!(result, "Focus: the {{audience}} angle for engineers. {{unknown}}");
        }
    }

    #[test]
    fn test_custom_prompt_text_with_config_variable_names() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let mut vars = HashMap::new();
        vars.insert("custom".to_string(), "Quote {{tone}} literally".to_string());

        let result = prompts.render_with_custom("{{custom}}; tone {{tone}}", &vars);
        assert_eq!(result, "Quote {{tone}} literally; tone formal");
    }

    #[test]
    fn test_provided_vars_win_over_config_vars() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("audience".to_string(), "engineers".to_string());
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let mut vars = HashMap::new();
        vars.insert("tone".to_string(), "casual".to_string());

        let result = prompts.render_with_custom("For {{audience}}, {{tone}}.", &vars);
        assert_eq!(result, "For engineers, casual.");
    }

    #[test]
    fn test_load_overrides_from_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("templates.toml"),
            "\"Key Points\" = \"List the five most important points:\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(
            prompts.template_override("key points"),
            Some("List the five most important points:")
        );
        assert!(prompts.template_override("Summary").is_none());
        assert_eq!(prompts.diagram.instruction, DiagramPrompts::default().instruction);
    }
}
