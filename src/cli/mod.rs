//! CLI module for Distill.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::compose::{OutputMode, TemplateKey};
use crate::generation::Backend;
use crate::source::SourceKind;
use clap::{Parser, Subcommand};

/// Distill - summaries, notes and charts from videos and web pages
///
/// Fetches a video's transcript or a page's text and asks an LLM to
/// transform it with one of a set of instruction templates.
#[derive(Parser, Debug)]
#[command(name = "distill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options for a single run.
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// YouTube URL/ID, or web page URL
    pub locator: String,

    /// Source kind (video, page); detected from the locator if omitted
    #[arg(short, long)]
    pub source: Option<SourceKind>,

    /// Instruction template (see `distill templates`)
    #[arg(short, long, default_value = "summary")]
    pub template: TemplateKey,

    /// Instruction text for the Custom template (implies --template custom)
    #[arg(long)]
    pub custom_prompt: Option<String>,

    /// Output mode (summary, diagram)
    #[arg(long, default_value = "summary")]
    pub mode: OutputMode,

    /// Generation backend (anthropic, openai); defaults to the configured one
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Model identifier; defaults to the backend's configured model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Upper bound on generated tokens (100-4000)
    #[arg(long, value_parser = clap::value_parser!(u32).range(100..=4000))]
    pub max_tokens: Option<u32>,

    /// API key; falls back to ANTHROPIC_API_KEY or OPENAI_API_KEY for the chosen backend
    #[arg(long)]
    pub api_key: Option<String>,

    /// Copy the generated text to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Where to write the chart in diagram mode (defaults to output.chart_path)
    #[arg(long)]
    pub chart_out: Option<String>,

    /// Print the run outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch content and transform it with an LLM
    Run(RunArgs),

    /// List the available instruction templates
    Templates,

    /// Start the browser form and JSON API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "distill",
            "-v",
            "run",
            "https://example.com/post",
            "--template",
            "tl-dr",
            "--mode",
            "diagram",
            "--backend",
            "openai",
            "--max-tokens",
            "250",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.template, TemplateKey::TlDr);
        assert_eq!(args.mode, OutputMode::Diagram);
        assert_eq!(args.backend, Some(Backend::OpenAi));
        assert_eq!(args.max_tokens, Some(250));
        assert!(args.source.is_none());
    }

    #[test]
    fn test_max_tokens_out_of_range_rejected() {
        for value in ["99", "4001"] {
            assert!(Cli::try_parse_from(["distill", "run", "x", "--max-tokens", value]).is_err());
        }
    }
}
