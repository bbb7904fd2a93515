//! Configuration file loader for monorepo-release
//!
//! Priority (high to low):
//! 1. Explicit `--config` path
//! 2. Project config (`<root>/.release-config.yaml`)
//! 3. Built-in defaults
//!
//! Fields missing from a file keep their default values.

use super::config::ReleaseConfig;
use crate::core::error::ReleaseError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
const CONFIG_FILENAME: &str = ".release-config.yaml";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Repository root
    pub project_path: PathBuf,

    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    pub async fn load(options: ConfigLoadOptions) -> Result<ReleaseConfig, ReleaseError> {
        let config = match options.config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path
                } else {
                    options.project_path.join(path)
                };
                Self::load_config_file(&path).await?.ok_or_else(|| ReleaseError::Config {
                    message: format!("config file not found: {}", path.display()),
                })?
            }
            None => {
                let path = options.project_path.join(CONFIG_FILENAME);
                Self::load_config_file(&path).await?.unwrap_or_default()
            }
        };

        config
            .validate()
            .map_err(|message| ReleaseError::Config { message })?;

        Ok(config)
    }

    /// Load configuration from a YAML file, `None` when it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<ReleaseConfig>, ReleaseError> {
        if !fs::try_exists(file_path).await? {
            tracing::debug!(path = %file_path.display(), "no release config file, using defaults");
            return Ok(None);
        }

        let content = fs::read_to_string(file_path)
            .await
            .map_err(|e| ReleaseError::Config {
                message: format!("Failed to read config file: {}", e),
            })?;

        let config: ReleaseConfig =
            serde_yaml::from_str(&content).map_err(|e| ReleaseError::Config {
                message: format!("Failed to parse YAML config: {}", e),
            })?;

        tracing::debug!(path = %file_path.display(), "loaded release config");
        Ok(Some(config))
    }
}
