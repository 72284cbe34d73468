//! Run command - fetch, compose, generate and render one session.

use crate::cli::{preflight, Output, RunArgs};
use crate::compose::TemplateKey;
use crate::config::Settings;
use crate::generation::Credential;
use crate::orchestrator::{Orchestrator, RunOutcome, Stage};
use crate::render::RenderedOutput;
use crate::session::Session;
use crate::source::detect_kind;
use anyhow::Result;
use std::path::Path;

/// Build the session for this invocation from command-line flags.
fn session_from_args(args: &RunArgs, settings: &Settings) -> Session {
    let mut session = Session::new(args.locator.trim());
    session.source = args.source;
    session.template = if args.custom_prompt.is_some() {
        TemplateKey::Custom
    } else {
        args.template
    };
    session.custom_prompt = args.custom_prompt.clone();
    session.mode = args.mode;
    session.backend = args.backend;
    session.model = args.model.clone();
    session.max_tokens = args.max_tokens;
    session.credential = args.api_key.clone().and_then(Credential::new);
    session.with_env_credential(settings)
}

/// Run the pipeline for one locator.
pub async fn run_distill(args: &RunArgs, settings: Settings) -> Result<()> {
    let session = session_from_args(args, &settings);

    let kind = session.source.or_else(|| detect_kind(&session.locator));
    if let Err(e) = preflight::check(
        kind,
        session.backend(&settings),
        session.credential.as_ref(),
        &settings.video.yt_dlp_path,
    ) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let chart_path = args
        .chart_out
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.chart_path());

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Starting...");
    let result = orchestrator
        .run(&session, |stage| match stage {
            Stage::Fetched(content) => spinner.suspend(|| {
                Output::content_info(
                    content.title.as_deref(),
                    content.preview_image_url.as_deref(),
                    content.chars,
                )
            }),
            other => spinner.set_message(other.to_string()),
        })
        .await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    if let RenderedOutput::Chart(artifact) = &outcome.rendered {
        write_chart(&chart_path, &artifact.svg)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, &chart_path);
    }

    if args.copy {
        copy_outcome(&outcome);
    }

    Ok(())
}

fn write_chart(path: &Path, svg: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, svg)?;
    Ok(())
}

fn print_outcome(outcome: &RunOutcome, chart_path: &Path) {
    match &outcome.rendered {
        RenderedOutput::Text(text) => {
            println!("{}", text.trim_end());
        }
        RenderedOutput::Chart(artifact) => {
            let title = match artifact.spec.title.trim() {
                "" => "Untitled",
                title => title,
            };
            Output::success(&format!("{} chart written to {}", title, chart_path.display()));
        }
        RenderedOutput::ChartFailed { error, raw } => {
            Output::error(&error.to_string());
            Output::header("Generated output");
            println!("{}", raw.trim_end());
        }
    }
}

fn copy_outcome(outcome: &RunOutcome) {
    let content = match &outcome.rendered {
        RenderedOutput::Chart(artifact) => match serde_json::to_string_pretty(&artifact.spec) {
            Ok(json) => json,
            Err(e) => {
                Output::warning(&format!("Could not copy chart: {}", e));
                return;
            }
        },
        other => other.text().unwrap_or_default().to_string(),
    };

    match copy_to_clipboard(&content) {
        Ok(()) => Output::success("Copied to clipboard."),
        Err(e) => Output::warning(&e),
    }
}

/// Copy text to the system clipboard.
fn copy_to_clipboard(content: &str) -> std::result::Result<(), String> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| format!("Failed to access clipboard: {}", e))?;
    clipboard
        .set_text(content)
        .map_err(|e| format!("Failed to set clipboard text: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::compose::OutputMode;
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["distill", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_custom_prompt_implies_custom_template() {
        let args = run_args(&["dQw4w9WgXcQ", "--custom-prompt", "List the books", "--api-key", "k"]);
        let session = session_from_args(&args, &Settings::default());
        assert_eq!(session.template, TemplateKey::Custom);
        assert_eq!(session.custom_prompt.as_deref(), Some("List the books"));
        assert_eq!(session.credential.as_ref().map(|c| c.expose()), Some("k"));
    }

    #[test]
    fn test_flags_carry_into_session() {
        let args = run_args(&[
            "https://example.com",
            "--template",
            "quotes",
            "--mode",
            "chart",
            "--model",
            "claude-3-5-sonnet-latest",
        ]);
        let session = session_from_args(&args, &Settings::default());
        assert_eq!(session.template, TemplateKey::Quotes);
        assert_eq!(session.mode, OutputMode::Diagram);
        assert_eq!(session.model.as_deref(), Some("claude-3-5-sonnet-latest"));
    }

    #[test]
    fn test_write_chart_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("out.svg");
        write_chart(&path, "<svg/>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
    }
}
