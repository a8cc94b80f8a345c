//! Sandboxed build executor
//!
//! Runs the recipe's build steps in order, each as a separate external
//! process. The stage is a strictly sequential state machine: the first
//! non-zero exit fails the whole operation and no subsequent step runs.
//! Steps are never retried.

use std::path::Path;

use kiln_errors::{BuildError, Error};
use kiln_events::{AppEvent, BuildEvent, EventEmitter};
use tokio::sync::watch;

use crate::environment::{expand_placeholders, BuildEnvironment};
use crate::recipe::BuildStep;

/// Execute build steps sequentially in `workdir`
///
/// # Errors
///
/// Returns `StepFailed` with the step index, exit code, and captured output
/// on the first non-zero exit; `StepTimeout` if a step exceeds the optional
/// per-step timeout; `Aborted` if the run is cancelled.
pub async fn run_steps(
    steps: &[BuildStep],
    env: &BuildEnvironment,
    workdir: &Path,
    timeout_seconds: Option<u64>,
    cancel: Option<&watch::Receiver<bool>>,
) -> Result<(), Error> {
    for (step_index, step) in steps.iter().enumerate() {
        let (program, raw_args) = step.command();
        let program = expand_placeholders(&program, env.env_vars())?;
        let mut args = Vec::with_capacity(raw_args.len());
        for arg in &raw_args {
            args.push(expand_placeholders(arg, env.env_vars())?);
        }

        env.emit(AppEvent::Build(BuildEvent::StepStarted {
            step_index,
            command: step.display(),
        }));

        let result = env
            .execute_step(
                step_index,
                &program,
                &args,
                workdir,
                timeout_seconds,
                cancel.cloned(),
            )
            .await?;

        if !result.success() {
            env.emit(AppEvent::Build(BuildEvent::StepFailed {
                step_index,
                exit_code: result.exit_code,
            }));
            return Err(BuildError::StepFailed {
                step_index,
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            }
            .into());
        }

        env.emit(AppEvent::Build(BuildEvent::StepCompleted { step_index }));
    }

    Ok(())
}
