//! pkg-config descriptor rendering
//!
//! A pure function from recipe and prefix to the generated file's text, so
//! the template is testable without running any build step.

use std::fmt::Write as _;
use std::path::Path;

use crate::recipe::Recipe;

/// Render the pkg-config descriptor for an installed artifact
///
/// `Name` and `Version` come from the recipe metadata; `libdir` and
/// `includedir` resolve under the given prefix.
#[must_use]
pub fn render_pkg_config(recipe: &Recipe, prefix: &Path) -> String {
    let spec = recipe.install.pkgconfig.clone().unwrap_or_default();
    let description = spec
        .description
        .unwrap_or_else(|| recipe.metadata.description.clone());

    let mut libs = vec!["-L${libdir}".to_string()];
    libs.extend(spec.libs);
    let mut cflags = vec!["-I${includedir}".to_string()];
    cflags.extend(spec.cflags);

    let mut out = String::new();
    let _ = writeln!(out, "prefix={}", prefix.display());
    out.push_str("exec_prefix=${prefix}\n");
    out.push_str("libdir=${exec_prefix}/lib\n");
    out.push_str("includedir=${prefix}/include\n");
    out.push('\n');
    let _ = writeln!(out, "Name: {}", recipe.metadata.name);
    let _ = writeln!(out, "Description: {description}");
    let _ = writeln!(out, "Version: {}", recipe.metadata.version);
    let _ = writeln!(out, "Requires: {}", spec.requires.join(", "));
    let _ = writeln!(out, "Conflicts: {}", spec.conflicts.join(", "));
    let _ = writeln!(out, "Libs: {}", libs.join(" "));
    let _ = writeln!(out, "Cflags: {}", cflags.join(" "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parse_recipe_str;
    use std::path::PathBuf;

    fn recipe() -> Recipe {
        parse_recipe_str(
            r#"
metadata:
  name: mad
  version: 0.16.4
  description: MPEG audio decoder

source:
  fetch:
    url: https://example.org/libmad-0.16.4.tar.gz
    checksum:
      sha256: "0974e77a9572a8d3503a30ebfcadbccb1ea0d2922c16b55e7a9e89ed3a0854d8"

build:
  steps:
    - make: [install]

install:
  pkgconfig:
    libs: [-lmad]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_version_matches_recipe() {
        let text = render_pkg_config(&recipe(), &PathBuf::from("/opt/kiln/live"));
        assert!(text.contains("Version: 0.16.4"));
        assert!(text.contains("Name: mad"));
    }

    #[test]
    fn test_dirs_resolve_under_prefix() {
        let text = render_pkg_config(&recipe(), &PathBuf::from("/opt/kiln/live"));
        assert!(text.starts_with("prefix=/opt/kiln/live\n"));
        assert!(text.contains("libdir=${exec_prefix}/lib"));
        assert!(text.contains("includedir=${prefix}/include"));
    }

    #[test]
    fn test_fixed_keys_present() {
        let text = render_pkg_config(&recipe(), &PathBuf::from("/p"));
        for key in [
            "prefix=", "exec_prefix=", "libdir=", "includedir=", "Name:", "Description:",
            "Version:", "Requires:", "Conflicts:", "Libs:", "Cflags:",
        ] {
            assert!(text.contains(key), "missing key {key}");
        }
        assert!(text.contains("Libs: -L${libdir} -lmad"));
        assert!(text.contains("Description: MPEG audio decoder"));
    }
}
