//! Recipe parsing and validation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RecipeError {
    #[error("failed to parse recipe: {message}")]
    Parse { message: String },

    #[error("recipe missing required field: {field}")]
    MissingField { field: String },

    #[error("recipe has no build steps")]
    NoSteps,

    #[error("invalid checksum in recipe: {message}")]
    InvalidChecksum { message: String },

    #[error("cannot read recipe {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("unresolved placeholder ${{{name}}} in recipe")]
    UnknownPlaceholder { name: String },
}

impl UserFacingError for RecipeError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Parse { .. } | Self::MissingField { .. } | Self::NoSteps => {
                Some("Correct the recipe definition before retrying the build.")
            }
            Self::InvalidChecksum { .. } => {
                Some("Declare the checksum as 64 hex characters under source.fetch.checksum.")
            }
            Self::ReadFailed { .. } => Some("Check that the recipe path exists and is readable."),
            Self::UnknownPlaceholder { .. } => {
                Some("Declare the variable under build.env or use a built-in placeholder.")
            }
        }
    }
}
