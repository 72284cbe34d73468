//! Pipeline orchestrator for Distill.
//!
//! Runs one session from content fetch to rendered output.

use crate::compose::Composer;
use crate::config::{Prompts, Settings};
use crate::error::{DistillError, Result};
use crate::generation::{AnthropicGenerator, Backend, GenerationRequest, Generator, OpenAiGenerator};
use crate::http::create_client;
use crate::render::{render, RenderedOutput};
use crate::session::Session;
use crate::source::{detect_kind, ContentSource, PageSource, SourceKind, VideoSource};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Progress reported while a run moves through the pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    Fetching(SourceKind),
    Fetched(ContentPreview),
    Composing,
    Generating { backend: Backend, model: String },
    Rendering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetching(SourceKind::Video) => write!(f, "Fetching transcript..."),
            Stage::Fetching(SourceKind::Page) => write!(f, "Fetching page..."),
            Stage::Fetched(preview) => write!(
                f,
                "Fetched {}",
                preview.title.as_deref().unwrap_or("content")
            ),
            Stage::Composing => write!(f, "Composing instruction..."),
            Stage::Generating { backend, model } => {
                write!(f, "Generating with {} ({})...", backend.display_name(), model)
            }
            Stage::Rendering => write!(f, "Rendering output..."),
        }
    }
}

/// What was fetched, minus the text itself.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPreview {
    pub kind: SourceKind,
    pub title: Option<String>,
    pub preview_image_url: Option<String>,
    pub chars: usize,
}

/// Result of a completed run.
#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub content: ContentPreview,
    pub backend: Backend,
    pub model: String,
    pub instruction_chars: usize,
    pub rendered: RenderedOutput,
}

/// The main orchestrator for the Distill pipeline.
pub struct Orchestrator {
    settings: Settings,
    composer: Composer,
    sources: Vec<Arc<dyn ContentSource>>,
    generators: Vec<Arc<dyn Generator>>,
}

impl Orchestrator {
    /// Create a new orchestrator with the configured sources and backends.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let composer = Composer::new(prompts, settings.prompts.length_hint);

        let client = create_client(&settings)?;

        let sources: Vec<Arc<dyn ContentSource>> = vec![
            Arc::new(VideoSource::with_config(
                client.clone(),
                &settings.video.yt_dlp_path,
                settings.video.languages.clone(),
            )),
            Arc::new(PageSource::new(client.clone())),
        ];

        let generators: Vec<Arc<dyn Generator>> = vec![
            Arc::new(AnthropicGenerator::new(
                client.clone(),
                &settings.generation.anthropic_base_url,
            )),
            Arc::new(OpenAiGenerator::new(client, &settings.generation.openai_base_url)),
        ];

        Ok(Self::with_components(settings, composer, sources, generators))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        composer: Composer,
        sources: Vec<Arc<dyn ContentSource>>,
        generators: Vec<Arc<dyn Generator>>,
    ) -> Self {
        Self {
            settings,
            composer,
            sources,
            generators,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn source_for(&self, kind: SourceKind) -> Result<&Arc<dyn ContentSource>> {
        self.sources
            .iter()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| DistillError::Config(format!("No {} source configured", kind)))
    }

    fn generator_for(&self, backend: Backend) -> Result<&Arc<dyn Generator>> {
        self.generators
            .iter()
            .find(|g| g.backend() == backend)
            .ok_or_else(|| DistillError::Config(format!("No {} backend configured", backend)))
    }

    /// Work out which source handles this session's locator.
    fn resolve_source(&self, session: &Session) -> Result<&Arc<dyn ContentSource>> {
        let locator = session.locator.trim();
        let kind = session.source.or_else(|| detect_kind(locator)).ok_or_else(|| {
            DistillError::InvalidInput(format!(
                "Not a YouTube video or http(s) page: {}",
                locator
            ))
        })?;

        let source = self.source_for(kind)?;
        if !source.can_handle(locator) {
            return Err(DistillError::InvalidInput(format!(
                "Not a {} locator: {}",
                kind, locator
            )));
        }
        Ok(source)
    }

    /// Run one session through fetch, compose, generate and render.
    ///
    /// Stages run strictly in order and the first failure ends the run. Input
    /// problems and a missing credential are reported before any network call.
    /// A diagram that cannot be drawn is not an error here: it comes back as
    /// `RenderedOutput::ChartFailed` with the raw text.
    pub async fn run<F>(&self, session: &Session, on_stage: F) -> Result<RunOutcome>
    where
        F: Fn(&Stage) + Send + Sync,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, mode = %session.mode, template = %session.template);
        self.run_inner(run_id, session, on_stage).instrument(span).await
    }

    async fn run_inner<F>(&self, run_id: Uuid, session: &Session, on_stage: F) -> Result<RunOutcome>
    where
        F: Fn(&Stage) + Send + Sync,
    {
        session.validate(&self.settings)?;

        let backend = session.backend(&self.settings);
        let credential = session.credential.clone().ok_or_else(|| {
            DistillError::MissingCredential(
                backend.display_name().to_string(),
                backend.env_var().to_string(),
            )
        })?;
        let generator = self.generator_for(backend)?;
        let source = self.resolve_source(session)?;
        let model = session.model(&self.settings);
        let max_tokens = session.max_tokens(&self.settings);

        on_stage(&Stage::Fetching(source.kind()));
        let fetched = source.fetch(session.locator.trim()).await?;
        let content = ContentPreview {
            kind: source.kind(),
            title: fetched.title.clone(),
            preview_image_url: fetched.preview_image_url.clone(),
            chars: fetched.text.len(),
        };
        info!("Fetched {} chars of {} content", content.chars, content.kind);
        on_stage(&Stage::Fetched(content.clone()));

        on_stage(&Stage::Composing);
        let instruction = self.composer.compose(
            &fetched.text,
            session.template,
            session.custom_prompt.as_deref(),
            session.mode,
            max_tokens,
        )?;
        let instruction_chars = instruction.len();

        on_stage(&Stage::Generating {
            backend,
            model: model.clone(),
        });
        let request = GenerationRequest {
            instruction,
            credential,
            max_tokens,
            model: model.clone(),
        };
        let text = generator.generate(&request).await?;

        on_stage(&Stage::Rendering);
        let rendered = render(&text, session.mode);
        info!("Run complete");

        Ok(RunOutcome {
            run_id,
            content,
            backend,
            model,
            instruction_chars,
            rendered,
        })
    }
}
