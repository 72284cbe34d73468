//! Declarative chart specifications produced in diagram mode.

use crate::error::{DistillError, Result};
use serde::{Deserialize, Serialize};

/// Supported chart shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

/// One named row of values, aligned with the chart labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// A chart described as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Remove a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

impl ChartSpec {
    /// Parse and validate generated text.
    pub fn parse(text: &str) -> Result<Self> {
        let spec: ChartSpec = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            DistillError::UnsafeExecution(format!("Output is not a valid chart specification: {}", e))
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check that the data can be drawn.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(DistillError::UnsafeExecution(msg));

        if self.labels.is_empty() {
            return fail("Chart has no labels".to_string());
        }
        if self.series.is_empty() {
            return fail("Chart has no data series".to_string());
        }

        for series in &self.series {
            if series.values.len() != self.labels.len() {
                return fail(format!(
                    "Series '{}' has {} values for {} labels",
                    series.name,
                    series.values.len(),
                    self.labels.len()
                ));
            }
            if series.values.iter().any(|v| !v.is_finite()) {
                return fail(format!("Series '{}' contains a non-finite value", series.name));
            }
        }

        if self.chart_type == ChartType::Pie {
            if self.series.len() != 1 {
                return fail("A pie chart takes exactly one series".to_string());
            }
            let values = &self.series[0].values;
            if values.iter().any(|v| *v < 0.0) {
                return fail("A pie chart cannot have negative values".to_string());
            }
            if values.iter().sum::<f64>() <= 0.0 {
                return fail("A pie chart needs a positive total".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAR: &str = r#"{
        "chart_type": "bar",
        "title": "Mentions per speaker",
        "x_label": "Speaker",
        "y_label": "Mentions",
        "labels": ["Ana", "Ben", "Cy"],
        "series": [{"name": "Mentions", "values": [4, 7.5, 1]}]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let spec = ChartSpec::parse(BAR).unwrap();
        assert_eq!(spec.chart_type, ChartType::Bar);
        assert_eq!(spec.labels.len(), 3);
        assert_eq!(spec.series[0].values, vec![4.0, 7.5, 1.0]);
    }

    #[test]
    fn test_parse_tolerates_code_fence() {
        let fenced = format!("```json\n{}\n```\n", BAR);
        assert_eq!(ChartSpec::parse(&fenced).unwrap(), ChartSpec::parse(BAR).unwrap());
    }

    #[test]
    fn test_python_script_is_rejected() {
        let script = "import matplotlib.pyplot as plt\nplt.bar(['a'], [1])\nplt.show()";
        assert!(matches!(
            ChartSpec::parse(script),
            Err(DistillError::UnsafeExecution(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"{"chart_type": "line", "labels": [], "series": [{"name": "a", "values": []}]}"#,
            r#"{"chart_type": "line", "labels": ["x"], "series": []}"#,
            r#"{"chart_type": "bar", "labels": ["x", "y"], "series": [{"name": "a", "values": [1]}]}"#,
            r#"{"chart_type": "pie", "labels": ["x"], "series": [{"name": "a", "values": [1]}, {"name": "b", "values": [2]}]}"#,
            r#"{"chart_type": "pie", "labels": ["x", "y"], "series": [{"name": "a", "values": [3, -1]}]}"#,
            r#"{"chart_type": "pie", "labels": ["x"], "series": [{"name": "a", "values": [0]}]}"#,
            r#"{"chart_type": "radar", "labels": ["x"], "series": [{"name": "a", "values": [1]}]}"#,
        ];
        for case in cases {
            assert!(
                matches!(ChartSpec::parse(case), Err(DistillError::UnsafeExecution(_))),
                "{}",
                case
            );
        }
    }
}
