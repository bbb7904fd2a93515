//! Orchestration layer for monorepo releases
//!
//! This module provides the publisher for individual packages and the
//! orchestrator that drives a release from sync to push.

pub mod publisher;
pub mod release;

// Re-export main types for convenience
pub use publisher::{PublishOutcome, Publisher, publish_args, tag_list};
pub use release::{
    Confirmation, ReleaseOptions, ReleaseOrchestrator, ReleaseReport, StdinConfirmation,
};
