//! Deployment artifact updates
//!
//! Container build files pin an exact release of the CLI package; this
//! module moves that pin to the version being released.

pub mod dockerfile;

pub use dockerfile::DeployFileUpdater;
