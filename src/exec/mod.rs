// ABOUTME: Command executor abstraction for shelling out to external programs.
// ABOUTME: Passed into every component that runs a local command.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Output from a local command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code of the command, `None` if terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Errors from running a command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Runs external programs and captures their output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, returning its captured output.
    ///
    /// A non-zero exit is not an error at this level; see [`run_checked`].
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Run a command and turn a non-zero exit into an error.
pub async fn run_checked(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
) -> Result<CommandOutput, ExecError> {
    let output = executor.execute(program, args).await?;
    if !output.success() {
        return Err(ExecError::NonZeroExit {
            program: program.to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Convenience for running a shell snippet through `bash -c`.
pub async fn run_shell(
    executor: &dyn CommandExecutor,
    script: &str,
) -> Result<CommandOutput, ExecError> {
    run_checked(executor, "bash", &["-c".to_string(), script.to_string()]).await
}

/// Executor backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        tracing::debug!("Running {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_executor_captures_stdout() {
        let output = SystemExecutor
            .execute("sh", &["-c".to_string(), "echo hello".to_string()])
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn run_shell_reports_non_zero_exit() {
        let err = run_shell(&SystemExecutor, "echo oops >&2; exit 3")
            .await
            .unwrap_err();
        match err {
            ExecError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = SystemExecutor
            .execute("/nonexistent/clusterup-test-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
