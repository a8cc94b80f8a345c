//! Test runner: post-install verification
//!
//! Compiles a tiny consumer program against the freshly installed artifact,
//! runs it with the recipe's fixture, and compares an observed property of
//! its output with the recipe's expectation. This is the pipeline's
//! acceptance gate.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use kiln_errors::{Error, VerifyError};
use kiln_events::{AppEvent, EventEmitter, VerifyEvent};

use crate::environment::BuildEnvironment;
use crate::recipe::{Recipe, TestExpectation, TestSpec};

/// Verify the installed artifact against the recipe's test stage
///
/// Returns the observed property on success, or `None` when the recipe
/// declares no test stage.
///
/// # Errors
///
/// Returns an error if the consumer program fails to compile or run, or if
/// the observed property does not equal the expectation. All of these are
/// overall pipeline failures even though installed files exist on disk.
pub async fn verify(
    recipe: &Recipe,
    env: &BuildEnvironment,
    prefix: &Path,
) -> Result<Option<String>, Error> {
    let Some(test) = &recipe.test else {
        env.emit_debug("recipe declares no test stage; skipping verification");
        return Ok(None);
    };

    env.emit(AppEvent::Verify(VerifyEvent::Started {
        package: recipe.metadata.name.clone(),
    }));

    match run_test(test, env, prefix).await {
        Ok(observed) => {
            env.emit(AppEvent::Verify(VerifyEvent::Completed {
                package: recipe.metadata.name.clone(),
                observed: observed.clone(),
            }));
            Ok(Some(observed))
        }
        Err(e) => {
            let (expected, actual) = match &e {
                Error::Verify(VerifyError::Mismatch { expected, actual }) => {
                    (expected.clone(), actual.clone())
                }
                other => (test.expect.describe(), other.to_string()),
            };
            env.emit(AppEvent::Verify(VerifyEvent::Failed {
                package: recipe.metadata.name.clone(),
                expected,
                actual,
            }));
            Err(e)
        }
    }
}

async fn run_test(test: &TestSpec, env: &BuildEnvironment, prefix: &Path) -> Result<String, Error> {
    let test_dir = env.test_dir();

    let source_path = test_dir.join("consumer.c");
    tokio::fs::write(&source_path, &test.program).await?;

    if let Some(fixture) = &test.fixture {
        let from = env.recipe_dir().join(fixture);
        if !from.is_file() {
            return Err(VerifyError::FixtureMissing {
                path: from.display().to_string(),
            }
            .into());
        }
        let name = from
            .file_name()
            .map_or_else(|| "fixture".into(), |n| n.to_os_string());
        tokio::fs::copy(&from, test_dir.join(name)).await?;
    }

    compile_consumer(test, env, prefix, test_dir).await?;

    let stdout = run_consumer(test, env, prefix, test_dir).await?;

    check_expectation(&test.expect, &stdout, test_dir)
}

async fn compile_consumer(
    test: &TestSpec,
    env: &BuildEnvironment,
    prefix: &Path,
    test_dir: &Path,
) -> Result<(), Error> {
    let cc = env
        .env_vars()
        .get("CC")
        .cloned()
        .unwrap_or_else(|| "cc".to_string());

    let mut args = vec![
        "consumer.c".to_string(),
        "-o".to_string(),
        "consumer".to_string(),
        format!("-I{}", prefix.join("include").display()),
        format!("-L{}", prefix.join("lib").display()),
    ];
    args.extend(test.libs.iter().cloned());

    let output = spawn_captured(&cc, &args, test_dir, env.env_vars())
        .await
        .map_err(|e| VerifyError::CompileFailed {
            message: format!("{cc}: {e}"),
        })?;

    if !output.status.success() {
        return Err(VerifyError::CompileFailed {
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(())
}

async fn run_consumer(
    test: &TestSpec,
    env: &BuildEnvironment,
    prefix: &Path,
    test_dir: &Path,
) -> Result<String, Error> {
    // The consumer links against the just-installed library
    let libdir = prefix.join("lib").display().to_string();
    let mut run_env = env.env_vars().clone();
    run_env.insert("LD_LIBRARY_PATH".to_string(), libdir.clone());
    run_env.insert("DYLD_FALLBACK_LIBRARY_PATH".to_string(), libdir);

    let consumer = test_dir.join("consumer").display().to_string();
    let output = spawn_captured(&consumer, &test.args, test_dir, &run_env)
        .await
        .map_err(|e| VerifyError::RunFailed {
            exit_code: None,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(VerifyError::RunFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn check_expectation(
    expect: &TestExpectation,
    stdout: &str,
    test_dir: &Path,
) -> Result<String, Error> {
    match expect {
        TestExpectation::FileSize { file, size } => {
            let path = test_dir.join(file);
            let actual = std::fs::metadata(&path).map(|m| m.len()).map_err(|e| {
                Error::from(VerifyError::RunFailed {
                    exit_code: None,
                    stderr: format!("expected output file {}: {e}", path.display()),
                })
            })?;
            if actual != *size {
                return Err(mismatch(&format!("{file} is {size} bytes"), &format!("{file} is {actual} bytes")));
            }
            Ok(format!("{file} is {actual} bytes"))
        }
        TestExpectation::OutputSize { size } => {
            let actual = stdout.len() as u64;
            if actual != *size {
                return Err(mismatch(
                    &format!("stdout is {size} bytes"),
                    &format!("stdout is {actual} bytes"),
                ));
            }
            Ok(format!("stdout is {actual} bytes"))
        }
        TestExpectation::Output { output } => {
            if stdout != output {
                return Err(mismatch(&format!("{output:?}"), &format!("{stdout:?}")));
            }
            Ok(format!("stdout equals {output:?}"))
        }
    }
}

fn mismatch(expected: &str, actual: &str) -> Error {
    VerifyError::Mismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
    .into()
}

async fn spawn_captured(
    program: &str,
    args: &[String],
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> std::io::Result<std::process::Output> {
    tokio::process::Command::new(program)
        .args(args)
        .env_clear()
        .envs(env_vars)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_size_expectation() {
        let temp = tempfile::tempdir().unwrap();
        let expect = TestExpectation::OutputSize { size: 4 };
        assert!(check_expectation(&expect, "abcd", temp.path()).is_ok());

        let err = check_expectation(&expect, "abcde", temp.path()).unwrap_err();
        assert!(matches!(err, Error::Verify(VerifyError::Mismatch { .. })));
    }

    #[test]
    fn test_file_size_expectation() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("out.wav"), vec![0u8; 4608]).unwrap();

        let expect = TestExpectation::FileSize {
            file: "out.wav".into(),
            size: 4608,
        };
        let observed = check_expectation(&expect, "", temp.path()).unwrap();
        assert_eq!(observed, "out.wav is 4608 bytes");
    }

    #[test]
    fn test_exact_output_expectation() {
        let temp = tempfile::tempdir().unwrap();
        let expect = TestExpectation::Output {
            output: "ok\n".into(),
        };
        assert!(check_expectation(&expect, "ok\n", temp.path()).is_ok());
        assert!(check_expectation(&expect, "ok", temp.path()).is_err());
    }
}
