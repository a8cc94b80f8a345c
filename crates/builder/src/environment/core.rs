//! Core `BuildEnvironment` struct and construction

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use kiln_errors::{BuildError, Error};
use kiln_events::{EventEmitter, EventSender};

use crate::core::config::BuildConfig;
use crate::core::context::BuildContext;
use crate::recipe::Recipe;

use super::variables::expand_placeholders;

/// Environment variables inherited from the caller's process
///
/// Everything else is cleared; one immutable map per run is the whole
/// environment a build step sees.
const PASSTHROUGH_VARS: &[&str] = &["PATH", "HOME", "CC", "TMPDIR"];

/// Build environment for one pipeline run
///
/// Owns the scratch layout (`sources/`, `stage/`, `test/` under a per-run
/// build root) and the immutable env-var map passed to every step. Never
/// shared across runs.
#[derive(Clone, Debug)]
pub struct BuildEnvironment {
    /// Package name
    name: String,
    /// Package version
    version: String,
    /// Per-run scratch root
    build_root: PathBuf,
    /// Downloaded and extracted sources
    sources_dir: PathBuf,
    /// Staging directory build steps install into (DESTDIR)
    stage_dir: PathBuf,
    /// Scratch directory for the verification consumer program
    test_dir: PathBuf,
    /// Install prefix, sole write target of the install stage
    prefix: PathBuf,
    /// Directory containing the recipe file, for fixture resolution
    recipe_dir: PathBuf,
    /// Environment variables, fixed for the lifetime of the run
    env_vars: HashMap<String, String>,
    /// Event sender for progress reporting
    event_sender: Option<EventSender>,
}

impl EventEmitter for BuildEnvironment {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl BuildEnvironment {
    /// Create a new build environment for one run
    ///
    /// Creates the scratch directory tree and constructs the env map from
    /// the passthrough set, the built-in placeholders, and the recipe's
    /// `build.env` (whose values may reference the built-ins).
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directories cannot be created or a
    /// recipe env value references an unknown placeholder.
    pub fn new(context: &BuildContext, recipe: &Recipe, config: &BuildConfig) -> Result<Self, Error> {
        let build_root = config
            .build_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("kiln-{}-{}", context.name, context.version));

        let sources_dir = build_root.join("sources");
        let stage_dir = build_root.join("stage");
        let test_dir = build_root.join("test");

        for dir in [&build_root, &sources_dir, &stage_dir, &test_dir] {
            std::fs::create_dir_all(dir).map_err(|e| BuildError::EnvironmentFailed {
                message: format!("cannot create {}: {e}", dir.display()),
            })?;
        }

        let jobs = config.jobs.unwrap_or_else(num_cpus::get);

        let mut env_vars = HashMap::new();
        for key in PASSTHROUGH_VARS {
            if let Ok(value) = std::env::var(key) {
                env_vars.insert((*key).to_string(), value);
            }
        }
        env_vars.insert("PREFIX".to_string(), context.prefix.display().to_string());
        env_vars.insert("DESTDIR".to_string(), stage_dir.display().to_string());
        env_vars.insert("JOBS".to_string(), jobs.to_string());
        env_vars.insert("NAME".to_string(), context.name.clone());
        env_vars.insert("VERSION".to_string(), context.version.clone());

        // Recipe env values may reference the built-ins, not each other
        for (key, value) in &recipe.build.env {
            let expanded = expand_placeholders(value, &env_vars)?;
            env_vars.insert(key.clone(), expanded);
        }

        let recipe_dir = context
            .recipe_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            name: context.name.clone(),
            version: context.version.clone(),
            build_root,
            sources_dir,
            stage_dir,
            test_dir,
            prefix: context.prefix.clone(),
            recipe_dir,
            env_vars,
            event_sender: context.event_sender.clone(),
        })
    }

    /// Package name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Scratch root for this run
    #[must_use]
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Directory sources are downloaded and extracted into
    #[must_use]
    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }

    /// Staging directory (DESTDIR) build steps install into
    #[must_use]
    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }

    /// Scratch directory for the verification consumer
    #[must_use]
    pub fn test_dir(&self) -> &Path {
        &self.test_dir
    }

    /// Install prefix
    #[must_use]
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Directory containing the recipe, for fixture resolution
    #[must_use]
    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }

    /// The run's environment variable map
    #[must_use]
    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env_vars
    }

    /// Remove the scratch tree
    ///
    /// Called at run end; on failure the scratch can be kept for diagnosis.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch tree cannot be removed.
    pub async fn cleanup(&self) -> Result<(), Error> {
        tokio::fs::remove_dir_all(&self.build_root).await?;
        Ok(())
    }
}
