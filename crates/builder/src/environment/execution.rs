//! Command execution in the controlled environment
//!
//! Every external invocation is observed as an explicit `ProcessResult`
//! value. The inherited process environment is cleared; a step sees exactly
//! the run's env map.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use kiln_errors::{BuildError, Error};
use tokio::sync::watch;

use super::core::BuildEnvironment;

/// Observed outcome of one external process invocation
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    /// Whether the process exited with status zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Wait until the cancellation flag is raised
///
/// Pends forever if the sender is dropped without cancelling.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl BuildEnvironment {
    /// Execute one build step as an external process
    ///
    /// The child runs with the environment map, `workdir` as its current
    /// directory, and captured stdout/stderr. An optional timeout and an
    /// optional cancellation flag both kill the child; a timeout is reported
    /// with its own marker, distinct from an ordinary step failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, times out, or the
    /// run is cancelled. A non-zero exit is NOT an error here; the caller
    /// owns that judgement.
    pub async fn execute_step(
        &self,
        step_index: usize,
        program: &str,
        args: &[String],
        workdir: &Path,
        timeout_seconds: Option<u64>,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ProcessResult, Error> {
        // A cancelled run launches nothing further
        if let Some(rx) = &mut cancel {
            if *rx.borrow_and_update() {
                return Err(BuildError::Aborted { step_index }.into());
            }
        }

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(self.env_vars())
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| BuildError::SpawnFailed {
            step_index,
            message: format!("{program}: {e}"),
        })?;

        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let timeout = async {
            match timeout_seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);

        let cancel_wait = async {
            match cancel.as_mut() {
                Some(rx) => cancelled(rx).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(cancel_wait);

        let output = tokio::select! {
            out = &mut wait => out.map_err(|e| BuildError::SpawnFailed {
                step_index,
                message: format!("{program}: {e}"),
            })?,
            // Dropping the wait future kills the child (kill_on_drop)
            () = &mut timeout => {
                return Err(BuildError::StepTimeout {
                    step_index,
                    seconds: timeout_seconds.unwrap_or_default(),
                }
                .into());
            }
            () = &mut cancel_wait => {
                return Err(BuildError::Aborted { step_index }.into());
            }
        };

        Ok(ProcessResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
