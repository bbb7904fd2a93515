//! Configuration structures and types for monorepo-release
//!
//! The release table is an immutable value handed to the orchestrator. The
//! defaults describe the saltcorn monorepo; a project file can override any
//! part of it (see `config_loader`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Directory holding the packages, relative to the repository root
    pub packages_dir: PathBuf,

    /// Library packages, in publish order
    pub packages: Vec<PackageEntry>,

    /// The CLI package, rewritten and published after every library
    pub cli: CliPackageConfig,

    /// Root manifest whose `workspaces` field is toggled off around CLI operations
    pub root_manifest: PathBuf,

    /// Deployment templates containing a pinned install of `pinned_package`
    pub deploy_files: Vec<PathBuf>,

    /// Package name matched in deploy files (default: the CLI package)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_package: Option<String>,

    /// npm access level passed to `npm publish`
    pub access: String,

    /// Fixed pauses between steps
    pub delays: DelayConfig,
}

/// A package taking part in the release
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageEntry {
    /// Registry-qualified package name
    pub name: String,

    /// Directory under `packages_dir`
    pub dir: String,

    /// Publish this package in this run
    #[serde(default)]
    pub publish: bool,
}

impl PackageEntry {
    pub fn new(name: &str, dir: &str, publish: bool) -> Self {
        Self {
            name: name.to_string(),
            dir: dir.to_string(),
            publish,
        }
    }
}

/// CLI package configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliPackageConfig {
    pub name: String,
    pub dir: String,

    /// Primary dist-tag for the CLI publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Delays in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayConfig {
    /// Countdown before the release starts when confirmation is skipped
    pub confirm_ms: u64,

    /// Pause after each library publish
    pub between_packages_ms: u64,

    /// Pause after all libraries are published, before the CLI
    pub before_cli_ms: u64,

    /// Pause before each additional dist-tag
    pub between_tags_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            confirm_ms: 5000,
            between_packages_ms: 3000,
            before_cli_ms: 5000,
            between_tags_ms: 3000,
        }
    }
}

impl DelayConfig {
    /// All delays set to zero
    pub fn none() -> Self {
        Self {
            confirm_ms: 0,
            between_packages_ms: 0,
            before_cli_ms: 0,
            between_tags_ms: 0,
        }
    }

    pub fn confirm(&self) -> Duration {
        Duration::from_millis(self.confirm_ms)
    }

    pub fn between_packages(&self) -> Duration {
        Duration::from_millis(self.between_packages_ms)
    }

    pub fn before_cli(&self) -> Duration {
        Duration::from_millis(self.before_cli_ms)
    }

    pub fn between_tags(&self) -> Duration {
        Duration::from_millis(self.between_tags_ms)
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            packages_dir: PathBuf::from("packages"),
            packages: default_packages(),
            cli: CliPackageConfig {
                name: "@saltcorn/cli".to_string(),
                dir: "saltcorn-cli".to_string(),
                tag: Some("next".to_string()),
            },
            root_manifest: PathBuf::from("package.json"),
            deploy_files: vec![
                PathBuf::from("Dockerfile.release"),
                PathBuf::from("Dockerfile.mobile.release"),
            ],
            pinned_package: None,
            access: "public".to_string(),
            delays: DelayConfig::default(),
        }
    }
}

fn default_packages() -> Vec<PackageEntry> {
    vec![
        PackageEntry::new("@saltcorn/db-common", "db-common", true),
        PackageEntry::new("@saltcorn/common-code", "common-code", true),
        PackageEntry::new("@saltcorn/plugins-loader", "plugins-loader", true),
        PackageEntry::new("@saltcorn/sqlite", "sqlite", true),
        PackageEntry::new("@saltcorn/sqlite-mobile", "sqlite-mobile", true),
        PackageEntry::new("@saltcorn/postgres", "postgres", true),
        PackageEntry::new("@saltcorn/types", "saltcorn-types", true),
        PackageEntry::new("@saltcorn/builder", "saltcorn-builder", true),
        PackageEntry::new("@saltcorn/filemanager", "filemanager", true),
        PackageEntry::new("@saltcorn/data", "saltcorn-data", true),
        PackageEntry::new("@saltcorn/admin-models", "saltcorn-admin-models", true),
        PackageEntry::new("@saltcorn/random-tests", "saltcorn-random-tests", false),
        PackageEntry::new("@saltcorn/server", "server", true),
        PackageEntry::new("@saltcorn/base-plugin", "saltcorn-base-plugin", true),
        PackageEntry::new("@saltcorn/markup", "saltcorn-markup", true),
        PackageEntry::new("@saltcorn/mobile-app", "saltcorn-mobile-app", true),
        PackageEntry::new("@saltcorn/mobile-builder", "saltcorn-mobile-builder", true),
        PackageEntry::new("@saltcorn/sbadmin2", "saltcorn-sbadmin2", true),
    ]
}

impl ReleaseConfig {
    /// Names whose dependency entries are rewritten to the release version
    pub fn known_package_names(&self) -> Vec<&str> {
        self.packages
            .iter()
            .map(|p| p.name.as_str())
            .chain(std::iter::once(self.cli.name.as_str()))
            .collect()
    }

    /// Absolute directory of a package under `root`
    pub fn package_path(&self, root: &Path, dir: &str) -> PathBuf {
        root.join(&self.packages_dir).join(dir)
    }

    /// Package name matched in deploy files
    pub fn pinned_package(&self) -> &str {
        self.pinned_package.as_deref().unwrap_or(&self.cli.name)
    }

    /// Check the table for duplicate names or directories
    pub fn validate(&self) -> Result<(), String> {
        let mut names = HashSet::new();
        let mut dirs = HashSet::new();

        for entry in &self.packages {
            if entry.name.is_empty() || entry.dir.is_empty() {
                return Err("package name and dir must not be empty".to_string());
            }
            if !names.insert(entry.name.as_str()) {
                return Err(format!("duplicate package name: {}", entry.name));
            }
            if !dirs.insert(entry.dir.as_str()) {
                return Err(format!("duplicate package dir: {}", entry.dir));
            }
        }

        if names.contains(self.cli.name.as_str()) {
            return Err(format!(
                "cli package {} is also listed in packages",
                self.cli.name
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = ReleaseConfig::default();

        assert_eq!(config.packages.len(), 18);
        assert_eq!(config.packages[0].name, "@saltcorn/db-common");
        assert_eq!(config.packages[17].dir, "saltcorn-sbadmin2");

        let unpublished: Vec<_> = config.packages.iter().filter(|p| !p.publish).collect();
        assert_eq!(unpublished.len(), 1);
        assert_eq!(unpublished[0].name, "@saltcorn/random-tests");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_known_package_names_include_cli() {
        let config = ReleaseConfig::default();
        let names = config.known_package_names();

        assert_eq!(names.len(), 19);
        assert_eq!(names.last(), Some(&"@saltcorn/cli"));
    }

    #[test]
    fn test_pinned_package_defaults_to_cli() {
        let mut config = ReleaseConfig::default();
        assert_eq!(config.pinned_package(), "@saltcorn/cli");

        config.pinned_package = Some("saltcorn".to_string());
        assert_eq!(config.pinned_package(), "saltcorn");
    }

    #[test]
    fn test_package_path() {
        let config = ReleaseConfig::default();
        let path = config.package_path(Path::new("/repo"), "sqlite");

        assert_eq!(path, PathBuf::from("/repo/packages/sqlite"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = ReleaseConfig::default();
        config
            .packages
            .push(PackageEntry::new("@saltcorn/sqlite", "other", true));
        assert!(config.validate().unwrap_err().contains("duplicate package name"));

        let mut config = ReleaseConfig::default();
        config.packages.push(PackageEntry::new("@x/y", "sqlite", true));
        assert!(config.validate().unwrap_err().contains("duplicate package dir"));
    }

    #[test]
    fn test_validate_rejects_cli_in_packages() {
        let mut config = ReleaseConfig::default();
        config
            .packages
            .push(PackageEntry::new("@saltcorn/cli", "cli-copy", true));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delays() {
        let delays = DelayConfig::default();
        assert_eq!(delays.confirm(), Duration::from_secs(5));
        assert_eq!(delays.between_tags(), Duration::from_secs(3));

        let none = DelayConfig::none();
        assert_eq!(none.before_cli(), Duration::ZERO);
    }
}
