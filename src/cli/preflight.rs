//! Pre-flight checks before a run.
//!
//! Validates that required tools and credentials are available before
//! starting a run that would otherwise fail midway.

use crate::error::{DistillError, Result};
use crate::generation::{Backend, Credential};
use crate::source::SourceKind;
use std::process::Command;

/// Run pre-flight checks for a run with the given source and backend.
///
/// The source kind is optional because it may only be known after detection.
pub fn check(
    source: Option<SourceKind>,
    backend: Backend,
    credential: Option<&Credential>,
    yt_dlp_path: &str,
) -> Result<()> {
    if credential.is_none() {
        return Err(DistillError::MissingCredential(
            backend.display_name().to_string(),
            backend.env_var().to_string(),
        ));
    }
    if source == Some(SourceKind::Video) {
        check_tool(yt_dlp_path)?;
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(DistillError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DistillError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(DistillError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
