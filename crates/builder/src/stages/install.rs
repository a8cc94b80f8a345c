//! Artifact installer
//!
//! Copies staged build outputs into the install prefix following the fixed
//! subtree convention (`lib/`, `include/`, `share/`), then writes generated
//! files. Install is all-or-nothing: any failure is reported, never
//! silently treated as success.

use std::path::{Path, PathBuf};

use kiln_errors::{Error, InstallError};
use kiln_events::{AppEvent, EventEmitter, InstallEvent};

use crate::environment::BuildEnvironment;
use crate::pkgconfig::render_pkg_config;
use crate::recipe::Recipe;

/// Subtrees copied from the staging directory into the prefix
const INSTALL_SUBTREES: &[&str] = &["lib", "include", "share"];

/// A successfully installed artifact
#[derive(Debug, Clone)]
pub struct InstalledArtifact {
    pub prefix: PathBuf,
    pub files_installed: usize,
}

/// Install staged build outputs into the prefix
///
/// Build steps install into the staging directory (`DESTDIR`); with the
/// usual autotools convention the staged tree mirrors the prefix path, so
/// the staged root is `stage/<prefix>` when that exists and `stage/`
/// otherwise.
///
/// # Errors
///
/// Returns an error if the staging directory holds no recognizable
/// artifact, or any copy or write fails. A partially populated prefix is
/// possible on failure and is reported as such.
pub async fn install(
    recipe: &Recipe,
    env: &BuildEnvironment,
    prefix: &Path,
) -> Result<InstalledArtifact, Error> {
    env.emit(AppEvent::Install(InstallEvent::Started {
        package: recipe.metadata.name.clone(),
        version: recipe.metadata.version.clone(),
    }));

    let result = copy_and_generate(recipe, env, prefix).await;

    match &result {
        Ok(artifact) => env.emit(AppEvent::Install(InstallEvent::Completed {
            package: recipe.metadata.name.clone(),
            version: recipe.metadata.version.clone(),
            files_installed: artifact.files_installed,
        })),
        Err(e) => env.emit(AppEvent::Install(InstallEvent::Failed {
            package: recipe.metadata.name.clone(),
            error: e.to_string(),
        })),
    }

    result
}

async fn copy_and_generate(
    recipe: &Recipe,
    env: &BuildEnvironment,
    prefix: &Path,
) -> Result<InstalledArtifact, Error> {
    let staged_root = staged_root(env.stage_dir(), prefix);

    let has_artifact = INSTALL_SUBTREES
        .iter()
        .any(|subtree| staged_root.join(subtree).is_dir());
    if !has_artifact {
        return Err(InstallError::MissingArtifact {
            path: staged_root.display().to_string(),
        }
        .into());
    }

    tokio::fs::create_dir_all(prefix)
        .await
        .map_err(|e| InstallError::PrefixFailed {
            path: prefix.display().to_string(),
            message: e.to_string(),
        })?;

    let mut files_installed = 0;
    for subtree in INSTALL_SUBTREES {
        let from = staged_root.join(subtree);
        if !from.is_dir() {
            continue;
        }
        let to = prefix.join(subtree);
        files_installed += copy_tree(&from, &to).await?;
    }

    if recipe.install.pkgconfig.is_some() {
        let pc_dir = prefix.join("lib").join("pkgconfig");
        tokio::fs::create_dir_all(&pc_dir)
            .await
            .map_err(|e| InstallError::PrefixFailed {
                path: pc_dir.display().to_string(),
                message: e.to_string(),
            })?;

        let pc_path = pc_dir.join(format!("{}.pc", recipe.metadata.name));
        let text = render_pkg_config(recipe, prefix);
        tokio::fs::write(&pc_path, text)
            .await
            .map_err(|e| InstallError::WriteFailed {
                path: pc_path.display().to_string(),
                message: e.to_string(),
            })?;
        files_installed += 1;
    }

    Ok(InstalledArtifact {
        prefix: prefix.to_path_buf(),
        files_installed,
    })
}

/// Resolve where build steps actually staged their output
fn staged_root(stage_dir: &Path, prefix: &Path) -> PathBuf {
    let mirrored = prefix
        .strip_prefix("/")
        .map_or_else(|_| stage_dir.join(prefix), |rel| stage_dir.join(rel));
    if mirrored.is_dir() {
        mirrored
    } else {
        stage_dir.to_path_buf()
    }
}

/// Recursively copy a directory tree, returning the file count
async fn copy_tree(from: &Path, to: &Path) -> Result<usize, Error> {
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || copy_tree_blocking(&from, &to))
        .await
        .map_err(|e| Error::internal(format!("task join error: {e}")))?
}

fn copy_tree_blocking(from: &Path, to: &Path) -> Result<usize, Error> {
    std::fs::create_dir_all(to).map_err(|e| InstallError::CopyFailed {
        path: to.display().to_string(),
        message: e.to_string(),
    })?;

    let mut count = 0;
    let entries = std::fs::read_dir(from).map_err(|e| InstallError::CopyFailed {
        path: from.display().to_string(),
        message: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| InstallError::CopyFailed {
            path: from.display().to_string(),
            message: e.to_string(),
        })?;
        let src = entry.path();
        let dst = to.join(entry.file_name());

        if src.is_dir() {
            count += copy_tree_blocking(&src, &dst)?;
        } else {
            std::fs::copy(&src, &dst).map_err(|e| InstallError::CopyFailed {
                path: src.display().to_string(),
                message: e.to_string(),
            })?;
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_root_prefers_mirrored_tree() {
        let temp = tempfile::tempdir().unwrap();
        let stage = temp.path().join("stage");
        let mirrored = stage.join("opt/kiln/live");
        std::fs::create_dir_all(&mirrored).unwrap();

        let root = staged_root(&stage, Path::new("/opt/kiln/live"));
        assert_eq!(root, mirrored);

        let root = staged_root(&stage, Path::new("/somewhere/else"));
        assert_eq!(root, stage);
    }

    #[tokio::test]
    async fn test_copy_tree_counts_files() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("from");
        std::fs::create_dir_all(from.join("nested")).unwrap();
        std::fs::write(from.join("libmad.a"), b"ar").unwrap();
        std::fs::write(from.join("nested/mad.h"), b"h").unwrap();

        let to = temp.path().join("to");
        let count = copy_tree(&from, &to).await.unwrap();
        assert_eq!(count, 2);
        assert!(to.join("nested/mad.h").exists());
    }
}
