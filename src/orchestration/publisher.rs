//! npm publishing with distribution tags
//!
//! A package is published once with the first tag of its tag list as the
//! primary dist-tag. Every further tag is attached afterwards with
//! `npm dist-tag add`, pausing before each call to stay clear of registry
//! rate limits.

use crate::security::command_executor::{CommandError, CommandOutcome, CommandRunner};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Build the tag list: per-call tags first, then the global extra tag
///
/// Empty tags are dropped; npm rejects `--tag ""`.
pub fn tag_list(tags: &[&str], extra_tag: Option<&str>) -> Vec<String> {
    let mut list: Vec<String> = tags
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect();
    list.extend(extra_tag.filter(|t| !t.is_empty()).map(str::to_string));
    list
}

/// Arguments for `npm publish`
pub fn publish_args(access: &str, primary_tag: Option<&str>) -> Vec<String> {
    let mut args = vec!["publish".to_string(), format!("--access={}", access)];
    if let Some(tag) = primary_tag {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }
    args
}

/// Commands run for one package
#[derive(Debug, Clone, Default)]
pub struct PublishOutcome {
    pub outcomes: Vec<CommandOutcome>,
}

impl PublishOutcome {
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

/// Publishes packages of one release version
pub struct Publisher {
    runner: Arc<dyn CommandRunner>,
    version: String,
    access: String,
    extra_tag: Option<String>,
    between_tags: Duration,
    stop_on_failure: bool,
}

impl Publisher {
    pub fn new(runner: Arc<dyn CommandRunner>, version: &str, access: &str) -> Self {
        Self {
            runner,
            version: version.to_string(),
            access: access.to_string(),
            extra_tag: None,
            between_tags: Duration::ZERO,
            stop_on_failure: true,
        }
    }

    /// Tag appended to every package's tag list (`-t/--tag`)
    pub fn with_extra_tag(mut self, tag: Option<String>) -> Self {
        self.extra_tag = tag;
        self
    }

    pub fn with_tag_delay(mut self, delay: Duration) -> Self {
        self.between_tags = delay;
        self
    }

    /// Keep adding dist-tags even when `npm publish` failed
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Publish the package `name` located in `dir`
    pub async fn publish(
        &self,
        name: &str,
        dir: &Path,
        tags: &[&str],
    ) -> Result<PublishOutcome, CommandError> {
        let tags = tag_list(tags, self.extra_tag.as_deref());
        let mut result = PublishOutcome::default();

        let args = publish_args(&self.access, tags.first().map(String::as_str));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let outcome = self.runner.run("npm", &args, dir).await?;
        let published = outcome.success;
        result.outcomes.push(outcome);

        if !published && self.stop_on_failure {
            tracing::warn!(package = name, "npm publish failed, skipping dist-tags");
            return Ok(result);
        }

        let spec = format!("{}@{}", name, self.version);
        for tag in tags.iter().skip(1) {
            sleep(self.between_tags).await;
            let outcome = self
                .runner
                .run("npm", &["dist-tag", "add", spec.as_str(), tag.as_str()], dir)
                .await?;
            let failed = !outcome.success;
            result.outcomes.push(outcome);
            if failed && self.stop_on_failure {
                break;
            }
        }

        tracing::info!(package = name, version = %self.version, ?tags, success = result.success(), "published");
        Ok(result)
    }
}
