//! Configuration module for Distill.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{DiagramPrompts, LengthPrompts, Prompts};
pub use settings::{
    GeneralSettings, GenerationSettings, OutputSettings, PromptSettings, Settings, VideoSettings,
    DEFAULT_USER_AGENT, MAX_MAX_TOKENS, MIN_MAX_TOKENS,
};
