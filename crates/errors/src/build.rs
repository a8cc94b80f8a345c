//! Build executor error types
//!
//! A hash mismatch means untrusted content and is never retried. Step
//! failures are treated as deterministic: re-running a failed compile rarely
//! succeeds without a code or environment change.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BuildError {
    #[error("hash mismatch for {file}: expected {expected}, got {actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("build step {step_index} failed with exit code {exit_code:?}")]
    StepFailed {
        step_index: usize,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("build step {step_index} timed out after {seconds} seconds")]
    StepTimeout { step_index: usize, seconds: u64 },

    #[error("build aborted at step {step_index}")]
    Aborted { step_index: usize },

    #[error("failed to launch step {step_index}: {message}")]
    SpawnFailed { step_index: usize, message: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("build environment setup failed: {message}")]
    EnvironmentFailed { message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::HashMismatch { .. } => {
                Some("The fetched source does not match the recipe checksum; do not trust it.")
            }
            Self::StepFailed { .. } => {
                Some("Inspect the captured step output, then fix the recipe or environment.")
            }
            Self::StepTimeout { .. } => Some("Increase the per-step timeout and rebuild."),
            Self::Aborted { .. } => Some("The build was cancelled; the prefix state is undefined."),
            Self::SpawnFailed { .. } => {
                Some("Check that the step's program is installed and on PATH.")
            }
            Self::ExtractionFailed { .. } | Self::EnvironmentFailed { .. } => None,
        }
    }
}
