//! Build configuration

use std::path::PathBuf;

/// Configuration for one `Builder`
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Root directory for per-run scratch trees (system temp dir if unset)
    pub build_root: Option<PathBuf>,

    /// Optional per-step timeout; a timed-out step kills the child and
    /// fails the pipeline with a distinct timeout marker
    pub step_timeout_seconds: Option<u64>,

    /// Parallelism hint exported as `${JOBS}` (CPU count if unset)
    pub jobs: Option<usize>,

    /// Keep the scratch tree after the run, for diagnosis
    pub keep_scratch: bool,
}

impl BuildConfig {
    /// Create configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scratch root
    #[must_use]
    pub fn with_build_root(mut self, build_root: PathBuf) -> Self {
        self.build_root = Some(build_root);
        self
    }

    /// Set the per-step timeout
    #[must_use]
    pub fn with_step_timeout(mut self, seconds: u64) -> Self {
        self.step_timeout_seconds = Some(seconds);
        self
    }

    /// Set the parallelism hint
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Keep the scratch tree after the run
    #[must_use]
    pub fn with_keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }
}
