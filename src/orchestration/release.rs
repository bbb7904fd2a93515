//! Release Orchestrator - drives a full monorepo release
//!
//! Stages run strictly in order:
//!
//! SYNC → INSPECT → CONFIRM → BUILD → PUBLISH_LIBS → PUBLISH_CLI →
//! UPDATE_DEPLOY_FILES → COMMIT_TAG_PUSH → DONE
//!
//! Every external command reports its exit status. By default the first
//! failing command aborts the release; with `keep_going` failures are logged,
//! collected in the report, and the release carries on. There is no rollback:
//! manifests already rewritten and packages already published stay that way.
//! The one exception is the root manifest, whose `workspaces` field is put
//! back even when the CLI publish fails or is interrupted with Ctrl-C.

use crate::core::config::ReleaseConfig;
use crate::core::error::ReleaseError;
use crate::core::state_machine::{ReleaseStage, ReleaseStateMachine, StageTransition};
use crate::deploy::DeployFileUpdater;
use crate::manifest::{VersionRewriter, WorkspaceToggle};
use crate::orchestration::publisher::Publisher;
use crate::security::command_executor::{CommandOutcome, CommandRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::sleep;

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupt_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await
    }
}

/// Release options passed from the CLI
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Version written into every manifest, used verbatim
    pub version: String,

    /// Extra dist-tag applied to every published package
    pub extra_tag: Option<String>,

    /// Skip the confirmation prompt and use the timed countdown instead
    pub assume_yes: bool,

    /// Log failed commands and continue instead of aborting
    pub keep_going: bool,
}

/// Operator confirmation before anything is modified
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, message: &str) -> io::Result<bool>;
}

/// Asks on stdin
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, message: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        stdout
            .write_all(format!("{} (yes/no): ", message).as_bytes())
            .await?;
        stdout.flush().await?;

        let mut reader = BufReader::new(io::stdin());
        let mut answer = String::new();
        reader.read_line(&mut answer).await?;

        let answer = answer.trim().to_lowercase();
        Ok(answer == "yes" || answer == "y")
    }
}

/// Result of a completed release
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub version: String,
    /// Packages whose publish commands all succeeded
    pub published: Vec<String>,
    /// Packages rewritten but not publishable
    pub skipped: Vec<String>,
    /// Failed commands tolerated under `keep_going`
    pub failures: Vec<CommandOutcome>,
    /// Deploy files where the version pin was not found
    pub unchanged_deploy_files: Vec<PathBuf>,
    pub stage: ReleaseStage,
    pub transitions: Vec<StageTransition>,
    pub duration: u64,
}

impl ReleaseReport {
    fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            published: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            unchanged_deploy_files: Vec::new(),
            stage: ReleaseStage::Sync,
            transitions: Vec::new(),
            duration: 0,
        }
    }

    pub fn success(&self) -> bool {
        self.stage == ReleaseStage::Done && self.failures.is_empty()
    }

    /// Plain-text summary for the terminal
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Release v{}", self.version),
            format!("  published: {}", self.published.len()),
        ];
        for name in &self.published {
            lines.push(format!("    - {}", name));
        }
        if !self.skipped.is_empty() {
            lines.push(format!("  not published: {}", self.skipped.join(", ")));
        }
        for path in &self.unchanged_deploy_files {
            lines.push(format!("  ⚠️  version pin not found in {}", path.display()));
        }
        for failure in &self.failures {
            lines.push(format!("  ❌ {}", failure));
        }
        lines.push(format!("  duration: {}s", self.duration / 1000));
        lines.join("\n")
    }
}

/// Main release orchestrator
pub struct ReleaseOrchestrator {
    root: PathBuf,
    config: ReleaseConfig,
    options: ReleaseOptions,
    runner: Arc<dyn CommandRunner>,
    confirmation: Box<dyn Confirmation>,
}

impl ReleaseOrchestrator {
    /// Create an orchestrator for the repository at `root`
    pub fn new<P: AsRef<Path>>(
        root: P,
        config: ReleaseConfig,
        options: ReleaseOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
            options,
            runner,
            confirmation: Box::new(StdinConfirmation),
        }
    }

    pub fn with_confirmation(mut self, confirmation: Box<dyn Confirmation>) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Run the release from SYNC to DONE
    pub async fn run(&self) -> Result<ReleaseReport, ReleaseError> {
        let start_time = Instant::now();
        let mut machine = ReleaseStateMachine::new();
        let mut report = ReleaseReport::new(&self.options.version);
        let root = self.root.as_path();

        // SYNC
        self.exec(&mut report, ReleaseStage::Sync, "git", &["pull"], root)
            .await?;

        // INSPECT
        machine.advance(ReleaseStage::Inspect)?;
        println!("\nCurrent branch: \n");
        self.exec(
            &mut report,
            ReleaseStage::Inspect,
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            root,
        )
        .await?;
        println!();
        self.exec(&mut report, ReleaseStage::Inspect, "git", &["show", "--summary"], root)
            .await?;

        // CONFIRM
        machine.advance(ReleaseStage::Confirm)?;
        self.confirm().await?;

        // BUILD
        machine.advance(ReleaseStage::Build)?;
        let cli_dir = self.config.package_path(root, &self.config.cli.dir);
        self.exec(&mut report, ReleaseStage::Build, "npm", &["install"], root)
            .await?;
        self.exec(&mut report, ReleaseStage::Build, "npm", &["run", "tsc"], root)
            .await?;
        self.exec(&mut report, ReleaseStage::Build, "npm", &["install"], &cli_dir)
            .await?;

        // PUBLISH_LIBS
        machine.advance(ReleaseStage::PublishLibs)?;
        let version = self.options.version.as_str();
        let rewriter = VersionRewriter::new(version, self.config.known_package_names());
        let publisher = Publisher::new(self.runner.clone(), version, &self.config.access)
            .with_extra_tag(self.options.extra_tag.clone())
            .with_tag_delay(self.config.delays.between_tags())
            .with_stop_on_failure(!self.options.keep_going);

        for entry in &self.config.packages {
            let dir = self.config.package_path(root, &entry.dir);
            rewriter.rewrite_file(&dir.join("package.json")).await?;

            if entry.publish {
                self.publish(
                    &mut report,
                    ReleaseStage::PublishLibs,
                    &publisher,
                    &entry.name,
                    &dir,
                    &[],
                )
                .await?;
                sleep(self.config.delays.between_packages()).await;
            } else {
                tracing::debug!(package = %entry.name, "not publishable, manifest rewritten only");
                report.skipped.push(entry.name.clone());
            }
        }
        sleep(self.config.delays.before_cli()).await;

        // PUBLISH_CLI
        machine.advance(ReleaseStage::PublishCli)?;
        rewriter.rewrite_file(&cli_dir.join("package.json")).await?;
        let toggle = WorkspaceToggle::disable(&root.join(&self.config.root_manifest)).await?;
        let cli_stage = async {
            self.exec(
                &mut report,
                ReleaseStage::PublishCli,
                "npm",
                &["update", "--legacy-peer-deps"],
                &cli_dir,
            )
            .await?;
            self.exec(&mut report, ReleaseStage::PublishCli, "npm", &["install"], root)
                .await?;
            let cli_tags: Vec<&str> = self.config.cli.tag.as_deref().into_iter().collect();
            self.publish(
                &mut report,
                ReleaseStage::PublishCli,
                &publisher,
                &self.config.cli.name,
                &cli_dir,
                &cli_tags,
            )
            .await
        };
        toggle
            .guard(ReleaseStage::PublishCli, cli_stage, interrupt_signal())
            .await?;

        // UPDATE_DEPLOY_FILES
        machine.advance(ReleaseStage::UpdateDeployFiles)?;
        let updater = DeployFileUpdater::new(self.config.pinned_package(), version).map_err(|e| {
            ReleaseError::Config {
                message: format!("invalid pinned package pattern: {}", e),
            }
        })?;
        for file in &self.config.deploy_files {
            if !updater.update_file(&root.join(file)).await? {
                report.unchanged_deploy_files.push(file.clone());
            }
        }

        // COMMIT_TAG_PUSH
        machine.advance(ReleaseStage::CommitTagPush)?;
        let tag = format!("v{}", version);
        let stage = ReleaseStage::CommitTagPush;
        self.exec(&mut report, stage, "git", &["commit", "-am", &tag], root)
            .await?;
        self.exec(&mut report, stage, "git", &["tag", "-a", &tag, "-m", &tag], root)
            .await?;
        self.exec(&mut report, stage, "git", &["push", "origin", &tag], root)
            .await?;
        self.exec(&mut report, stage, "git", &["push"], root).await?;

        // DONE
        machine.advance(ReleaseStage::Done)?;
        println!("Now run:\n");
        println!(
            "  rm -rf {}\n",
            self.config
                .packages_dir
                .join(&self.config.cli.dir)
                .join("node_modules")
                .display()
        );
        println!("  rm -rf node_modules\n");

        report.stage = machine.current_stage();
        report.transitions = machine.transitions().to_vec();
        report.duration = start_time.elapsed().as_millis() as u64;

        Ok(report)
    }

    async fn confirm(&self) -> Result<(), ReleaseError> {
        if self.options.assume_yes {
            let delay = self.config.delays.confirm();
            println!(
                "Release begins in {} seconds, press Ctrl-C to abort",
                delay.as_secs()
            );
            sleep(delay).await;
            return Ok(());
        }

        let message = format!("Release v{} from this branch?", self.options.version);
        if self.confirmation.confirm(&message).await? {
            Ok(())
        } else {
            Err(ReleaseError::Aborted)
        }
    }

    async fn exec(
        &self,
        report: &mut ReleaseReport,
        stage: ReleaseStage,
        program: &str,
        args: &[&str],
        dir: &Path,
    ) -> Result<(), ReleaseError> {
        let outcome = self
            .runner
            .run(program, args, dir)
            .await
            .map_err(|source| ReleaseError::Command { stage, source })?;

        self.check(report, stage, outcome)
    }

    async fn publish(
        &self,
        report: &mut ReleaseReport,
        stage: ReleaseStage,
        publisher: &Publisher,
        name: &str,
        dir: &Path,
        tags: &[&str],
    ) -> Result<(), ReleaseError> {
        println!("\n📦 Publishing {}", name);
        let result = publisher
            .publish(name, dir, tags)
            .await
            .map_err(|source| ReleaseError::Command { stage, source })?;

        let success = result.success();
        for outcome in result.outcomes {
            self.check(report, stage, outcome)?;
        }
        if success {
            report.published.push(name.to_string());
        }

        Ok(())
    }

    fn check(
        &self,
        report: &mut ReleaseReport,
        stage: ReleaseStage,
        outcome: CommandOutcome,
    ) -> Result<(), ReleaseError> {
        if outcome.success {
            return Ok(());
        }

        if self.options.keep_going {
            tracing::warn!(%stage, command = %outcome, "command failed, continuing");
            report.failures.push(outcome);
            return Ok(());
        }

        Err(ReleaseError::CommandFailed {
            stage,
            command: outcome.command_line(),
            status: outcome.status_label(),
        })
    }
}
