//! Version pin rewriting for deployment templates
//!
//! Templates install the CLI with a line such as
//! `RUN npm install -g @saltcorn/cli@1.0.0 --unsafe`. The first
//! `<package>@<anything> --unsafe` on a line is replaced; everything else
//! in the file is kept as is.

use crate::core::error::ReleaseError;
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::path::Path;
use tokio::fs;

/// Rewrites the pinned install command in deploy templates
#[derive(Debug, Clone)]
pub struct DeployFileUpdater {
    pattern: Regex,
    replacement: String,
}

impl DeployFileUpdater {
    pub fn new(pinned_package: &str, version: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"{}@.* --unsafe", regex::escape(pinned_package)))?;

        Ok(Self {
            pattern,
            replacement: format!("{}@{} --unsafe", pinned_package, version),
        })
    }

    /// Apply the pin to `content`; `None` if the pattern is absent
    pub fn apply<'a>(&self, content: &'a str) -> Option<Cow<'a, str>> {
        if !self.pattern.is_match(content) {
            return None;
        }
        Some(
            self.pattern
                .replacen(content, 1, NoExpand(&self.replacement)),
        )
    }

    /// Update the template at `path` in place
    ///
    /// Returns `false` when the pin was not found. The file is still written
    /// back unchanged in that case.
    pub async fn update_file(&self, path: &Path) -> Result<bool, ReleaseError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ReleaseError::DeployFile {
                path: path.to_path_buf(),
                source,
            })?;

        let (updated, found) = match self.apply(&content) {
            Some(updated) => (updated, true),
            None => (Cow::Borrowed(content.as_str()), false),
        };

        fs::write(path, updated.as_bytes())
            .await
            .map_err(|source| ReleaseError::DeployFile {
                path: path.to_path_buf(),
                source,
            })?;

        if found {
            tracing::debug!(path = %path.display(), pin = %self.replacement, "updated deploy file");
        } else {
            tracing::warn!(
                path = %path.display(),
                pattern = %self.pattern,
                "version pin not found in deploy file, left unchanged"
            );
        }

        Ok(found)
    }
}
