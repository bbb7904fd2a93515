//! Shared test helpers

use crate::security::command_executor::{CommandError, CommandOutcome, CommandRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A command seen by [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl RecordedCall {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Records every command instead of running it
///
/// Commands whose command line starts with one of the `failing` prefixes
/// exit with status 1.
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(prefixes: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::command_line).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<CommandOutcome, CommandError> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
        };
        let line = call.command_line();
        let success = !self.failing.iter().any(|prefix| line.starts_with(prefix));
        self.calls.lock().unwrap().push(call.clone());

        Ok(CommandOutcome {
            program: call.program,
            args: call.args,
            working_dir: call.working_dir,
            success,
            exit_code: Some(if success { 0 } else { 1 }),
        })
    }
}
