pub mod core;
pub mod deploy;
pub mod manifest;
pub mod orchestration;
pub mod security;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::core::*;
pub use deploy::DeployFileUpdater;
pub use manifest::{VersionRewriter, WorkspaceToggle};
pub use orchestration::{ReleaseOptions, ReleaseOrchestrator, ReleaseReport};
pub use security::{CommandError, CommandOutcome, CommandRunner, SafeCommandExecutor};
