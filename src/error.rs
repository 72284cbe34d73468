//! Error types for Distill.

use thiserror::Error;

/// Library-level error type for Distill operations.
#[derive(Error, Debug)]
pub enum DistillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch denied by robots.txt: {0}")]
    FetchDenied(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Page fetch failed: {0}")]
    PageFetch(String),

    #[error("Missing credential for {0}. Pass --api-key or set {1}.")]
    MissingCredential(String, String),

    #[error("Unexpected response from generation service: {0}")]
    MalformedResponse(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Diagram could not be rendered: {0}")]
    UnsafeExecution(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Distill operations.
pub type Result<T> = std::result::Result<T, DistillError>;
