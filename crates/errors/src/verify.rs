//! Post-install verification error types
//!
//! Verification is the pipeline's acceptance gate: a successful install with
//! a failing verification is an overall pipeline failure.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VerifyError {
    #[error("verification mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("test program failed to compile: {message}")]
    CompileFailed { message: String },

    #[error("test program exited with {exit_code:?}: {stderr}")]
    RunFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("test fixture not found: {path}")]
    FixtureMissing { path: String },
}

impl UserFacingError for VerifyError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Mismatch { .. } => {
                Some("The installed artifact is unusable even though files exist on disk.")
            }
            Self::CompileFailed { .. } => {
                Some("Check that a C compiler is available and the prefix include/lib paths.")
            }
            Self::RunFailed { .. } => Some("Inspect the test program's captured stderr."),
            Self::FixtureMissing { .. } => {
                Some("Fixture paths resolve relative to the recipe file's directory.")
            }
        }
    }
}
