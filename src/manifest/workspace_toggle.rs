//! Temporarily removes the `workspaces` field from the root package.json
//!
//! While the CLI package is updated and published, npm must treat it as a
//! standalone package. The original file content is restored byte for byte
//! by [`WorkspaceToggle::restore`], by [`WorkspaceToggle::guard`] when the
//! operator interrupts the guarded work, or on drop if the release bails out
//! before getting there.

use super::package_json::{parse_manifest, VersionRewriter};
use crate::core::error::ReleaseError;
use crate::core::state_machine::ReleaseStage;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Guard holding the original root manifest
#[derive(Debug)]
pub struct WorkspaceToggle {
    path: PathBuf,
    original: Option<String>,
}

impl WorkspaceToggle {
    /// Rewrite the manifest at `path` without its `workspaces` field
    pub async fn disable(path: &Path) -> Result<Self, ReleaseError> {
        let original = fs::read_to_string(path)
            .await
            .map_err(|source| ReleaseError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })?;

        let mut manifest = parse_manifest(path, &original)?;
        let removed = manifest.shift_remove("workspaces").is_some();

        let rendered =
            VersionRewriter::render(&manifest).map_err(|source| ReleaseError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(path, rendered)
            .await
            .map_err(|source| ReleaseError::ManifestWrite {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), removed, "disabled root workspaces");

        Ok(Self {
            path: path.to_path_buf(),
            original: Some(original),
        })
    }

    /// Run `work` while the workspaces are disabled, then restore
    ///
    /// If `interrupt` completes first, `work` is dropped, the manifest is
    /// restored and `ReleaseError::Interrupted` is returned for `stage`.
    pub async fn guard<W, I, T>(
        self,
        stage: ReleaseStage,
        work: W,
        interrupt: I,
    ) -> Result<T, ReleaseError>
    where
        W: Future<Output = Result<T, ReleaseError>>,
        I: Future<Output = ()>,
    {
        tokio::select! {
            result = work => {
                let value = result?;
                self.restore().await?;
                Ok(value)
            }
            () = interrupt => {
                tracing::warn!(%stage, "release interrupted, restoring root manifest");
                self.restore().await?;
                Err(ReleaseError::Interrupted { stage })
            }
        }
    }

    /// Write the original manifest back
    pub async fn restore(mut self) -> Result<(), ReleaseError> {
        if let Some(original) = self.original.take() {
            fs::write(&self.path, original)
                .await
                .map_err(|source| ReleaseError::ManifestWrite {
                    path: self.path.clone(),
                    source,
                })?;
            tracing::debug!(path = %self.path.display(), "restored root manifest");
        }
        Ok(())
    }
}

impl Drop for WorkspaceToggle {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            match std::fs::write(&self.path, original) {
                Ok(()) => tracing::warn!(
                    path = %self.path.display(),
                    "release stopped early, restored root manifest"
                ),
                Err(e) => tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to restore root manifest"
                ),
            }
        }
    }
}
