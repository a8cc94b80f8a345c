//! Placeholder expansion for build step arguments and env values
//!
//! Steps are structured program+args values; `${VAR}` placeholders are the
//! only templating they get, resolved against the run's environment map.
//! No shell is involved.

use std::collections::HashMap;

use kiln_errors::{Error, RecipeError};

/// Expand `${VAR}` placeholders in `input` against `vars`
///
/// A `$` not followed by `{` is passed through untouched, so shell-visible
/// strings like `$@` survive.
///
/// # Errors
///
/// Returns an error if a referenced variable is not present in `vars` or a
/// `${` is never closed.
#[allow(clippy::implicit_hasher)]
pub fn expand_placeholders(input: &str, vars: &HashMap<String, String>) -> Result<String, Error> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(RecipeError::UnknownPlaceholder {
                name: after.to_string(),
            }
            .into());
        };
        let name = &after[..end];
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(RecipeError::UnknownPlaceholder {
                    name: name.to_string(),
                }
                .into())
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("PREFIX".to_string(), "/opt/kiln/live".to_string());
        map.insert("JOBS".to_string(), "8".to_string());
        map
    }

    #[test]
    fn test_expand_single() {
        let out = expand_placeholders("--prefix=${PREFIX}", &vars()).unwrap();
        assert_eq!(out, "--prefix=/opt/kiln/live");
    }

    #[test]
    fn test_expand_multiple() {
        let out = expand_placeholders("${PREFIX}/lib:-j${JOBS}", &vars()).unwrap();
        assert_eq!(out, "/opt/kiln/live/lib:-j8");
    }

    #[test]
    fn test_no_placeholder_passthrough() {
        let out = expand_placeholders("make install $@", &vars()).unwrap();
        assert_eq!(out, "make install $@");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = expand_placeholders("${MISSING}", &vars()).unwrap_err();
        assert!(matches!(
            err,
            Error::Recipe(RecipeError::UnknownPlaceholder { ref name }) if name == "MISSING"
        ));
    }

    #[test]
    fn test_unclosed_placeholder_rejected() {
        assert!(expand_placeholders("${PREFIX", &vars()).is_err());
    }
}
