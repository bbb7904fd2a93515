//! Version and dependency rewriting for package.json manifests
//!
//! # Example
//!
//! ```no_run
//! use monorepo_release::manifest::VersionRewriter;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let rewriter = VersionRewriter::new("1.2.0", ["@saltcorn/data", "@saltcorn/cli"]);
//! rewriter
//!     .rewrite_file(Path::new("packages/server/package.json"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::core::error::ReleaseError;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

/// Manifest sections whose entries map package names to version ranges
pub const DEPENDENCY_SECTIONS: [&str; 3] =
    ["dependencies", "devDependencies", "optionalDependencies"];

/// What a rewrite changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub previous_version: Option<String>,
    /// `(section, package name)` pairs set to the release version
    pub rewritten_dependencies: Vec<(String, String)>,
}

/// Sets a manifest's version and pins known internal dependencies to it
#[derive(Debug, Clone)]
pub struct VersionRewriter {
    version: String,
    known_names: Vec<String>,
}

impl VersionRewriter {
    pub fn new<I, S>(version: &str, known_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.to_string(),
            known_names: known_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rewrite a parsed manifest in place
    ///
    /// Only keys already present in a dependency section are touched; every
    /// other field and the key order are left as they were.
    pub fn apply(&self, manifest: &mut Map<String, Value>) -> RewriteSummary {
        let previous_version = manifest
            .insert("version".to_string(), Value::String(self.version.clone()))
            .and_then(|v| v.as_str().map(str::to_string));

        let mut rewritten_dependencies = Vec::new();
        for section in DEPENDENCY_SECTIONS {
            let Some(Value::Object(deps)) = manifest.get_mut(section) else {
                continue;
            };
            for name in &self.known_names {
                if let Some(range) = deps.get_mut(name) {
                    *range = Value::String(self.version.clone());
                    rewritten_dependencies.push((section.to_string(), name.clone()));
                }
            }
        }

        RewriteSummary {
            previous_version,
            rewritten_dependencies,
        }
    }

    /// Render a manifest the way it is written to disk: 2-space indent, no trailing newline
    pub fn render(manifest: &Map<String, Value>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(manifest)
    }

    /// Load, rewrite and write back the manifest at `path`
    pub async fn rewrite_file(&self, path: &Path) -> Result<RewriteSummary, ReleaseError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ReleaseError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })?;

        let mut manifest = parse_manifest(path, &content)?;
        let summary = self.apply(&mut manifest);

        let rendered = Self::render(&manifest).map_err(|source| ReleaseError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, rendered)
            .await
            .map_err(|source| ReleaseError::ManifestWrite {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            version = %self.version,
            previous = ?summary.previous_version,
            dependencies = summary.rewritten_dependencies.len(),
            "rewrote manifest"
        );

        Ok(summary)
    }
}

/// Parse a manifest, which must be a JSON object
pub(crate) fn parse_manifest(path: &Path, content: &str) -> Result<Map<String, Value>, ReleaseError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| ReleaseError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ReleaseError::ManifestParse {
            path: path.to_path_buf(),
            source: <serde_json::Error as serde::de::Error>::custom(
                "manifest root must be a JSON object",
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const KNOWN: [&str; 3] = ["@saltcorn/data", "@saltcorn/markup", "@saltcorn/cli"];

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_known_dependencies_are_pinned() {
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);
        let mut manifest = object(json!({
            "name": "@saltcorn/server",
            "version": "1.0.0",
            "dependencies": {
                "@saltcorn/data": "1.0.0",
                "express": "^4.18.0"
            },
            "devDependencies": { "@saltcorn/markup": "~1.0.0", "jest": "29.0.0" },
            "optionalDependencies": { "@saltcorn/cli": "1.0.0" }
        }));

        let summary = rewriter.apply(&mut manifest);

        assert_eq!(summary.previous_version.as_deref(), Some("1.0.0"));
        assert_eq!(summary.rewritten_dependencies.len(), 3);
        assert_eq!(manifest["version"], "2.0.0");
        assert_eq!(manifest["dependencies"]["@saltcorn/data"], "2.0.0");
        assert_eq!(manifest["devDependencies"]["@saltcorn/markup"], "2.0.0");
        assert_eq!(manifest["optionalDependencies"]["@saltcorn/cli"], "2.0.0");
        // unrelated entries are untouched
        assert_eq!(manifest["dependencies"]["express"], "^4.18.0");
        assert_eq!(manifest["devDependencies"]["jest"], "29.0.0");
    }

    #[test]
    fn test_manifest_without_dependency_sections() {
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);
        let mut manifest = object(json!({
            "name": "@saltcorn/types",
            "version": "1.0.0",
            "main": "index.js"
        }));

        let summary = rewriter.apply(&mut manifest);

        assert!(summary.rewritten_dependencies.is_empty());
        assert_eq!(
            Value::Object(manifest),
            json!({ "name": "@saltcorn/types", "version": "2.0.0", "main": "index.js" })
        );
    }

    #[test]
    fn test_missing_version_field_is_added() {
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);
        let mut manifest = object(json!({ "name": "x" }));

        let summary = rewriter.apply(&mut manifest);

        assert_eq!(summary.previous_version, None);
        assert_eq!(manifest["version"], "2.0.0");
    }

    #[test]
    fn test_render_preserves_key_order_and_indent() {
        let manifest = object(json!({
            "version": "2.0.0",
            "name": "z-first-would-sort-last",
            "dependencies": { "b": "1", "a": "2" }
        }));

        let rendered = VersionRewriter::render(&manifest).unwrap();

        assert_eq!(
            rendered,
            "{\n  \"version\": \"2.0.0\",\n  \"name\": \"z-first-would-sort-last\",\n  \"dependencies\": {\n    \"b\": \"1\",\n    \"a\": \"2\"\n  }\n}"
        );
    }

    #[tokio::test]
    async fn test_rewrite_file_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"name":"@saltcorn/server","version":"1.0.0","dependencies":{"@saltcorn/data":"1.0.0","express":"^4"}}"#,
        )
        .unwrap();
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);

        rewriter.rewrite_file(&path).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        rewriter.rewrite_file(&path).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.contains("\"@saltcorn/data\": \"2.0.0\""));
        assert!(text.contains("\"express\": \"^4\""));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);

        let result = rewriter.rewrite_file(&dir.path().join("package.json")).await;

        assert!(matches!(result, Err(ReleaseError::ManifestRead { .. })));
    }

    #[tokio::test]
    async fn test_malformed_manifest_is_left_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{ not json").unwrap();
        let rewriter = VersionRewriter::new("2.0.0", KNOWN);

        let result = rewriter.rewrite_file(&path).await;

        assert!(matches!(result, Err(ReleaseError::ManifestParse { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_non_object_manifest_is_rejected() {
        let result = parse_manifest(Path::new("package.json"), "[1, 2]");

        assert!(matches!(result, Err(ReleaseError::ManifestParse { .. })));
    }
}
