//! Monorepo Release CLI
//!
//! Bumps, publishes and tags every package of the monorepo in one go

use anyhow::{Context, Result};
use clap::Parser;
use monorepo_release::{
    ConfigLoadOptions, ConfigLoader, ReleaseError, ReleaseOptions, ReleaseOrchestrator,
    SafeCommandExecutor,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Release a new version of every package in the monorepo
#[derive(Parser)]
#[command(name = "monorepo-release")]
#[command(version)]
#[command(about = "Release a new version of every package in the monorepo", long_about = None)]
struct Cli {
    /// New version number
    #[arg(value_name = "VERSION")]
    release_version: String,

    /// Extra npm dist-tag applied to every published package
    #[arg(short, long)]
    tag: Option<String>,

    /// Repository root (defaults to current directory)
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Release config file (defaults to <root>/.release-config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the confirmation prompt, start after a short countdown
    #[arg(short, long)]
    yes: bool,

    /// Continue when a command fails instead of aborting; failures are
    /// listed in the summary and the exit code stays 0
    #[arg(long)]
    keep_going: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            if let Some(release_error) = e.downcast_ref::<ReleaseError>() {
                eprintln!("\n[{}]", release_error.code());
                for action in release_error.suggested_actions() {
                    eprintln!("  - {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RELEASE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    println!("\n🚀 monorepo-release v{}\n", cli.release_version);

    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path: cli.root.clone(),
        config_path: cli.config.clone(),
    })
    .await?;

    let options = ReleaseOptions {
        version: cli.release_version,
        extra_tag: cli.tag,
        assume_yes: cli.yes,
        keep_going: cli.keep_going,
    };

    let orchestrator = ReleaseOrchestrator::new(
        &cli.root,
        config,
        options,
        Arc::new(SafeCommandExecutor::new()),
    );

    let keep_going = cli.keep_going;
    let report = orchestrator
        .run()
        .await
        .with_context(|| format!("release stopped in {}", cli.root.display()))?;

    println!("{}", report.summary());

    if report.success() {
        println!("\n✅ Release completed successfully!");
    } else {
        println!("\n⚠️  Release completed with failed commands");
    }

    Ok(exit_code(report.success(), keep_going))
}

/// Failed commands only fail the process when the release was not asked to keep going
fn exit_code(success: bool, keep_going: bool) -> i32 {
    if success || keep_going { 0 } else { 1 }
}
