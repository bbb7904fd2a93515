//! package.json handling for the release set
//!
//! This module rewrites package versions and internal dependency ranges,
//! and temporarily hides the root `workspaces` field during CLI operations.

pub mod package_json;
pub mod workspace_toggle;

pub use package_json::{RewriteSummary, VersionRewriter, DEPENDENCY_SECTIONS};
pub use workspace_toggle::WorkspaceToggle;
