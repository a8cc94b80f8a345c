//! High-level build orchestration
//!
//! Drives parse, fetch & verify, build steps, install, and verification, in
//! that order. Each stage is a hard gate: the first failure aborts the
//! pipeline and is surfaced to the caller unchanged.

use std::path::PathBuf;

use kiln_errors::Error;
use kiln_events::EventEmitter;
use kiln_net::NetClient;
use tokio::sync::watch;

use crate::environment::BuildEnvironment;
use crate::recipe::{parse_recipe_file, Recipe};
use crate::stages;

use super::config::BuildConfig;
use super::context::BuildContext;

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildReport {
    pub name: String,
    pub version: String,
    pub prefix: PathBuf,
    pub files_installed: usize,
    /// Observed test property, present when the recipe has a test stage
    pub observed: Option<String>,
}

/// Recipe build pipeline
#[derive(Clone)]
pub struct Builder {
    config: BuildConfig,
    net: Option<NetClient>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Builder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BuildConfig::default(),
            net: None,
            cancel: None,
        }
    }

    /// Create a builder with configuration
    #[must_use]
    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            net: None,
            cancel: None,
        }
    }

    /// Set the network client
    #[must_use]
    pub fn with_net(mut self, net: NetClient) -> Self {
        self.net = Some(net);
        self
    }

    /// Set the cancellation flag
    ///
    /// When the flag becomes true the executor stops launching further
    /// external commands, the running child is terminated, and the run
    /// fails as aborted - never reported as success.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run the full pipeline for one recipe
    ///
    /// # Errors
    ///
    /// Returns the first stage failure: recipe parse/validation, fetch,
    /// hash verification, a build step, install, or the acceptance test.
    pub async fn build(&self, context: &BuildContext) -> Result<BuildReport, Error> {
        let operation = format!("build {} {}", context.name, context.version);
        context.emit_operation_started(operation.clone());

        let recipe = parse_recipe_file(&context.recipe_path).await?;
        let env = BuildEnvironment::new(context, &recipe, &self.config)?;

        let result = self.run_pipeline(&recipe, &env).await;

        if self.config.keep_scratch {
            env.emit_debug(format!("keeping scratch at {}", env.build_root().display()));
        } else if let Err(e) = env.cleanup().await {
            env.emit_warning(format!("scratch cleanup failed: {e}"));
        }

        context.emit_operation_completed(operation, result.is_ok());

        let (artifact, observed) = result?;
        Ok(BuildReport {
            name: recipe.metadata.name,
            version: recipe.metadata.version,
            prefix: artifact.prefix,
            files_installed: artifact.files_installed,
            observed,
        })
    }

    async fn run_pipeline(
        &self,
        recipe: &Recipe,
        env: &BuildEnvironment,
    ) -> Result<(stages::InstalledArtifact, Option<String>), Error> {
        let net = match &self.net {
            Some(net) => net.clone(),
            None => NetClient::with_defaults()?,
        };

        // Hard gate: nothing builds against unverified source
        let src_dir = stages::source::fetch_and_verify(recipe, env, &net).await?;

        stages::build::run_steps(
            &recipe.build.steps,
            env,
            &src_dir,
            self.config.step_timeout_seconds,
            self.cancel.as_ref(),
        )
        .await?;

        let artifact = stages::install::install(recipe, env, env.prefix()).await?;

        // Acceptance gate: a successful install with a failing verification
        // is an overall pipeline failure
        let observed = stages::verify::verify(recipe, env, env.prefix()).await?;

        Ok((artifact, observed))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
