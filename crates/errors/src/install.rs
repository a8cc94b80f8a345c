//! Artifact installation error types
//!
//! Install is all-or-nothing: a partially populated prefix is reported as a
//! failure, never silently treated as success.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("build produced no artifact under {path}")]
    MissingArtifact { path: String },

    #[error("failed to copy {path}: {message}")]
    CopyFailed { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("cannot create prefix directory {path}: {message}")]
    PrefixFailed { path: String, message: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingArtifact { .. } => {
                Some("Check that the recipe's install step populated the staging directory.")
            }
            Self::CopyFailed { .. } | Self::WriteFailed { .. } | Self::PrefixFailed { .. } => {
                Some("Check permissions on the install prefix; the prefix may be partial.")
            }
        }
    }
}
