//! SafeCommandExecutor: whitelisted external command execution
//!
//! Every `npm` and `git` invocation of a release goes through the
//! [`CommandRunner`] trait. The real executor inherits the terminal's stdio so
//! the operator sees the tools' own output, and reports the exit status back
//! as a [`CommandOutcome`] instead of discarding it.
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Working directory validation**: Checked before execution

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist
const ALLOWED_COMMANDS: &[&str] = &["npm", "git"];

/// Errors that can occur before a command produces an exit status
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be spawned (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub success: bool,
    /// `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutcome {
    /// Command line as typed by an operator
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.command_line(), self.status_label())
    }
}

/// Seam for launching external processes
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `working_dir` and wait for it to exit
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<CommandOutcome, CommandError>;
}

/// Safe command executor with security controls
#[derive(Debug, Default)]
pub struct SafeCommandExecutor {
    /// Print `<dir>$ <command>` before each invocation
    echo: bool,
}

impl SafeCommandExecutor {
    pub fn new() -> Self {
        Self { echo: true }
    }

    /// Executor that does not echo command lines
    pub fn quiet() -> Self {
        Self { echo: false }
    }

    fn validate(program: &str, working_dir: &Path) -> Result<(), CommandError> {
        if !ALLOWED_COMMANDS.contains(&program) {
            return Err(CommandError::CommandNotAllowed(program.to_string()));
        }
        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(
                working_dir.to_path_buf(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<CommandOutcome, CommandError> {
        Self::validate(program, working_dir)?;

        // Windows-specific: npm is a .cmd file, not .exe
        #[cfg(target_os = "windows")]
        let command_name = if program == "npm" {
            format!("{}.cmd", program)
        } else {
            program.to_string()
        };

        #[cfg(not(target_os = "windows"))]
        let command_name = program.to_string();

        if self.echo {
            println!("{}$ {} {}", working_dir.display(), program, args.join(" "));
        }
        tracing::debug!(program, ?args, dir = %working_dir.display(), "running command");

        // stdio is inherited so the operator sees npm/git output directly
        let status = Command::new(&command_name)
            .args(args)
            .current_dir(working_dir)
            .status()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", program, e)))?;

        let outcome = CommandOutcome {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
            success: status.success(),
            exit_code: status.code(),
        };
        tracing::debug!(command = %outcome, success = outcome.success, "command finished");

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::quiet();
        let result = executor
            .run("rm", &["-rf", "/"], &std::env::temp_dir())
            .await;

        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[tokio::test]
    async fn test_rejected_command_cargo() {
        let executor = SafeCommandExecutor::quiet();
        let result = executor
            .run("cargo", &["publish"], &std::env::temp_dir())
            .await;

        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_invalid_working_directory() {
        let executor = SafeCommandExecutor::quiet();
        let result = executor
            .run(
                "git",
                &["status"],
                Path::new("/nonexistent/directory/that/does/not/exist"),
            )
            .await;

        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[test]
    fn test_outcome_formatting() {
        let outcome = CommandOutcome {
            program: "npm".to_string(),
            args: vec!["publish".to_string(), "--access=public".to_string()],
            working_dir: PathBuf::from("packages/sqlite"),
            success: false,
            exit_code: Some(1),
        };

        assert_eq!(outcome.command_line(), "npm publish --access=public");
        assert_eq!(outcome.to_string(), "npm publish --access=public (exit code 1)");

        let signalled = CommandOutcome {
            exit_code: None,
            ..outcome
        };
        assert_eq!(signalled.status_label(), "terminated by signal");
    }
}
