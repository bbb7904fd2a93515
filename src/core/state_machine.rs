//! Stage tracking for the release workflow
//!
//! A release moves through a fixed, linear sequence of stages. The tracker
//! only accepts the next stage in that sequence and keeps a timestamped
//! history for the final report. Nothing is persisted.

use crate::core::error::ReleaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Release stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStage {
    Sync,
    Inspect,
    Confirm,
    Build,
    PublishLibs,
    PublishCli,
    UpdateDeployFiles,
    CommitTagPush,
    Done,
}

impl ReleaseStage {
    /// All stages in execution order
    pub const ALL: [ReleaseStage; 9] = [
        Self::Sync,
        Self::Inspect,
        Self::Confirm,
        Self::Build,
        Self::PublishLibs,
        Self::PublishCli,
        Self::UpdateDeployFiles,
        Self::CommitTagPush,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "SYNC",
            Self::Inspect => "INSPECT",
            Self::Confirm => "CONFIRM",
            Self::Build => "BUILD",
            Self::PublishLibs => "PUBLISH_LIBS",
            Self::PublishCli => "PUBLISH_CLI",
            Self::UpdateDeployFiles => "UPDATE_DEPLOY_FILES",
            Self::CommitTagPush => "COMMIT_TAG_PUSH",
            Self::Done => "DONE",
        }
    }

    /// The stage that follows this one, `None` for `Done`
    pub fn next(&self) -> Option<ReleaseStage> {
        let index = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageTransition {
    pub from: ReleaseStage,
    pub to: ReleaseStage,
    pub timestamp: DateTime<Utc>,
}

/// Linear stage tracker for a single release run
#[derive(Debug)]
pub struct ReleaseStateMachine {
    current_stage: ReleaseStage,
    started_at: DateTime<Utc>,
    transitions: Vec<StageTransition>,
}

impl Default for ReleaseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseStateMachine {
    /// Create a tracker positioned at the first stage
    pub fn new() -> Self {
        Self {
            current_stage: ReleaseStage::Sync,
            started_at: Utc::now(),
            transitions: Vec::new(),
        }
    }

    /// Move to `to`, which must be the stage directly after the current one
    pub fn advance(&mut self, to: ReleaseStage) -> Result<(), ReleaseError> {
        if self.current_stage.next() != Some(to) {
            return Err(ReleaseError::Stage {
                from: self.current_stage,
                to,
            });
        }

        tracing::info!(from = %self.current_stage, to = %to, "release stage changed");
        self.transitions.push(StageTransition {
            from: self.current_stage,
            to,
            timestamp: Utc::now(),
        });
        self.current_stage = to;

        Ok(())
    }

    pub fn current_stage(&self) -> ReleaseStage {
        self.current_stage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn transitions(&self) -> &[StageTransition] {
        &self.transitions
    }

    pub fn is_done(&self) -> bool {
        self.current_stage == ReleaseStage::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_stage() {
        let machine = ReleaseStateMachine::new();

        assert_eq!(machine.current_stage(), ReleaseStage::Sync);
        assert!(machine.transitions().is_empty());
        assert!(!machine.is_done());
    }

    #[test]
    fn test_full_progression() {
        let mut machine = ReleaseStateMachine::new();

        for stage in &ReleaseStage::ALL[1..] {
            machine.advance(*stage).unwrap();
        }

        assert!(machine.is_done());
        assert_eq!(machine.transitions().len(), ReleaseStage::ALL.len() - 1);
        assert_eq!(machine.transitions()[0].from, ReleaseStage::Sync);
        assert_eq!(machine.transitions()[0].to, ReleaseStage::Inspect);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let mut machine = ReleaseStateMachine::new();

        let result = machine.advance(ReleaseStage::Build);

        assert!(matches!(
            result,
            Err(ReleaseError::Stage {
                from: ReleaseStage::Sync,
                to: ReleaseStage::Build
            })
        ));
        assert_eq!(machine.current_stage(), ReleaseStage::Sync);
    }

    #[test]
    fn test_going_backwards_is_rejected() {
        let mut machine = ReleaseStateMachine::new();
        machine.advance(ReleaseStage::Inspect).unwrap();

        assert!(machine.advance(ReleaseStage::Sync).is_err());
        assert!(machine.advance(ReleaseStage::Inspect).is_err());
    }

    #[test]
    fn test_done_has_no_next_stage() {
        assert_eq!(ReleaseStage::Done.next(), None);
        assert_eq!(ReleaseStage::PublishCli.next(), Some(ReleaseStage::UpdateDeployFiles));
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&ReleaseStage::CommitTagPush).unwrap();
        assert_eq!(json, "\"COMMIT_TAG_PUSH\"");
        assert_eq!(ReleaseStage::UpdateDeployFiles.to_string(), "UPDATE_DEPLOY_FILES");
    }
}
