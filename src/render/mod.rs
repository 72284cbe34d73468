//! Output rendering.
//!
//! Summary output is passed through as text. Diagram output is read as a
//! declarative chart specification and drawn by a fixed SVG renderer.

mod chart;
mod svg;

pub use chart::{ChartSpec, ChartType, Series};
pub use svg::render_svg;

use crate::compose::OutputMode;
use crate::error::DistillError;
use serde::{Serialize, Serializer};
use tracing::warn;

/// A successfully drawn chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartArtifact {
    pub spec: ChartSpec,
    pub svg: String,
}

/// What the user gets back from a run.
#[derive(Debug)]
pub enum RenderedOutput {
    /// Generated text, shown verbatim.
    Text(String),
    /// A chart drawn from the generated specification.
    Chart(ChartArtifact),
    /// The generated diagram could not be drawn; the raw output is kept for display.
    ChartFailed { error: DistillError, raw: String },
}

impl RenderedOutput {
    /// The text to show or copy: generated text, or the raw output of a failed chart.
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderedOutput::Text(text) => Some(text),
            RenderedOutput::Chart(_) => None,
            RenderedOutput::ChartFailed { raw, .. } => Some(raw),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RenderedView<'a> {
    Text { text: &'a str },
    Chart { spec: &'a ChartSpec, svg: &'a str },
    ChartFailed { error: String, raw: &'a str },
}

impl Serialize for RenderedOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let view = match self {
            RenderedOutput::Text(text) => RenderedView::Text { text },
            RenderedOutput::Chart(artifact) => RenderedView::Chart {
                spec: &artifact.spec,
                svg: &artifact.svg,
            },
            RenderedOutput::ChartFailed { error, raw } => RenderedView::ChartFailed {
                error: error.to_string(),
                raw,
            },
        };
        view.serialize(serializer)
    }
}

/// Turn generated text into displayable output for the given mode.
pub fn render(text: &str, mode: OutputMode) -> RenderedOutput {
    match mode {
        OutputMode::Summary => RenderedOutput::Text(text.to_string()),
        OutputMode::Diagram => match ChartSpec::parse(text) {
            Ok(spec) => {
                let svg = render_svg(&spec);
                RenderedOutput::Chart(ChartArtifact { spec, svg })
            }
            Err(error) => {
                warn!("Diagram rejected: {}", error);
                RenderedOutput::ChartFailed {
                    error,
                    raw: text.to_string(),
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_passes_text_through() {
        let out = render("  A short summary.\n", OutputMode::Summary);
        assert!(matches!(&out, RenderedOutput::Text(t) if t == "  A short summary.\n"));
        assert_eq!(out.text(), Some("  A short summary.\n"));
    }

    #[test]
    fn test_valid_diagram_renders_svg() {
        let text = r#"{"chart_type": "pie", "title": "Topics", "labels": ["AI", "Rust"], "series": [{"name": "minutes", "values": [3, 9]}]}"#;
        match render(text, OutputMode::Diagram) {
            RenderedOutput::Chart(artifact) => {
                assert_eq!(artifact.spec.chart_type, ChartType::Pie);
                assert!(artifact.svg.contains("<svg"));
                assert!(artifact.svg.contains("Topics"));
            }
            other => panic!("expected chart, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_diagram_keeps_raw_text() {
        let script = "import os\nos.system('rm -rf /')\n";
        match render(script, OutputMode::Diagram) {
            RenderedOutput::ChartFailed { error, raw } => {
                assert!(matches!(error, DistillError::UnsafeExecution(_)));
                assert_eq!(raw, script);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(render("plain", OutputMode::Summary)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "text", "text": "plain"}));

        let json = serde_json::to_value(render("not json", OutputMode::Diagram)).unwrap();
        assert_eq!(json["kind"], "chart_failed");
        assert_eq!(json["raw"], "not json");
        assert!(json["error"].as_str().unwrap().starts_with("Diagram could not be rendered"));
    }
}
