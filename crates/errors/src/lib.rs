#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the kiln build pipeline
//!
//! This crate provides fine-grained error types organized by pipeline stage.
//! Every stage surfaces failures to the caller immediately; nothing here
//! swallows an error from an earlier stage.

use std::borrow::Cow;

use thiserror::Error;

pub mod build;
pub mod install;
pub mod network;
pub mod recipe;
pub mod verify;

// Re-export all error types at the root
pub use build::BuildError;
pub use install::InstallError;
pub use network::NetworkError;
pub use recipe::RecipeError;
pub use verify::VerifyError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("verification error: {0}")]
    Verify(#[from] VerifyError),

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Internal {
            message: format!("I/O error: {error}"),
        }
    }
}

/// Trait for rendering errors to end users
///
/// The CLI uses this to print a message, an optional hint, and whether the
/// failed operation is safe to retry.
pub trait UserFacingError {
    /// Human-readable message describing the failure
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional hint about how to resolve the failure
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation may succeed
    fn is_retryable(&self) -> bool {
        false
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Recipe(e) => e.user_hint(),
            Self::Network(e) => e.user_hint(),
            Self::Build(e) => e.user_hint(),
            Self::Install(e) => e.user_hint(),
            Self::Verify(e) => e.user_hint(),
            Self::Internal { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Recipe(_)
            | Self::Build(_)
            | Self::Install(_)
            | Self::Verify(_)
            | Self::Internal { .. } => false,
        }
    }
}
