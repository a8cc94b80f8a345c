//! Recipe parsing and validation
//!
//! Parsing has no side effects. A recipe that is missing its source URL,
//! checksum, or build steps is rejected here, before anything runs.

use std::path::Path;

use kiln_errors::{Error, RecipeError};

use super::model::Recipe;

/// Parse a recipe from a YAML string
///
/// # Errors
///
/// Returns an error if the document is not valid YAML or fails validation.
pub fn parse_recipe_str(input: &str) -> Result<Recipe, Error> {
    let recipe: Recipe = serde_yml::from_str(input).map_err(|e| RecipeError::Parse {
        message: e.to_string(),
    })?;
    validate(&recipe)?;
    Ok(recipe)
}

/// Parse a recipe from a file on disk
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, or fails
/// validation.
pub async fn parse_recipe_file(path: &Path) -> Result<Recipe, Error> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RecipeError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    parse_recipe_str(&content)
}

fn validate(recipe: &Recipe) -> Result<(), Error> {
    if recipe.metadata.name.is_empty() {
        return Err(missing("metadata.name"));
    }
    if recipe.metadata.version.is_empty() {
        return Err(missing("metadata.version"));
    }
    if recipe.source.fetch.url.is_empty() {
        return Err(missing("source.fetch.url"));
    }
    // Reject a malformed digest before the download starts
    recipe.source.fetch.checksum.parse()?;
    if recipe.build.steps.is_empty() {
        return Err(RecipeError::NoSteps.into());
    }
    Ok(())
}

fn missing(field: &str) -> Error {
    RecipeError::MissingField {
        field: field.to_string(),
    }
    .into()
}
