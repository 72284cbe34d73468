//! Distill - summaries, notes and charts from videos and web pages
//!
//! Fetches a video's spoken transcript or a web page's visible text, asks a
//! large-language-model service to transform it with an instruction template,
//! and renders the result as text or as a chart.
//!
//! # Architecture
//!
//! One run is a linear pipeline:
//!
//! - `session` - the user's choices for one run
//! - `source` - content fetchers (video captions, web pages with robots.txt checks)
//! - `compose` - instruction templates and composition
//! - `generation` - LLM backends (Anthropic, OpenAI)
//! - `render` - text passthrough, or a declarative chart drawn as SVG
//! - `orchestrator` - runs a session through the stages in order
//!
//! # Example
//!
//! ```rust,no_run
//! use distill::config::Settings;
//! use distill::orchestrator::Orchestrator;
//! use distill::render::RenderedOutput;
//! use distill::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let session = Session::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .with_env_credential(&settings);
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator.run(&session, |stage| eprintln!("{}", stage)).await?;
//!     if let RenderedOutput::Text(text) = outcome.rendered {
//!         println!("{}", text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod source;

pub use error::{DistillError, Result};
