//! Error handling for release orchestration
//!
//! This module provides the error type returned by every release stage,
//! with recovery guidance, using the thiserror crate.

use crate::core::state_machine::ReleaseStage;
use crate::security::command_executor::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Configuration errors
    #[error("設定ファイルの読み込みに失敗しました: {message}")]
    Config { message: String },

    // Manifest errors
    #[error("マニフェストを読み込めません: {}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("マニフェストのJSONが不正です: {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("マニフェストを書き込めません: {}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Deploy file errors
    #[error("デプロイファイルを更新できません: {}", .path.display())]
    DeployFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Command execution errors
    #[error("[{stage}] コマンドが失敗しました: {command} ({status})")]
    CommandFailed {
        stage: ReleaseStage,
        command: String,
        status: String,
    },

    #[error("[{stage}] コマンドを実行できません: {source}")]
    Command {
        stage: ReleaseStage,
        #[source]
        source: CommandError,
    },

    // Flow errors
    #[error("リリースは中止されました")]
    Aborted,

    #[error("[{stage}] リリースが中断されました (Ctrl-C)")]
    Interrupted { stage: ReleaseStage },

    #[error("不正なステージ遷移です: {from} -> {to}")]
    Stage { from: ReleaseStage, to: ReleaseStage },

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleaseError {
    /// Get the stage in which a command error happened, if any
    pub fn stage(&self) -> Option<ReleaseStage> {
        match self {
            Self::CommandFailed { stage, .. }
            | Self::Command { stage, .. }
            | Self::Interrupted { stage } => Some(*stage),
            _ => None,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Config { .. } => vec![
                ".release-config.yamlの内容を確認してください",
                "--configオプションで指定したパスを確認してください",
            ],
            Self::ManifestRead { .. } | Self::ManifestParse { .. } => vec![
                "package.jsonが存在し、正しいJSONであることを確認してください",
                "既に書き換えられたマニフェストはgit checkoutで元に戻せます",
            ],
            Self::ManifestWrite { .. } | Self::DeployFile { .. } | Self::Io(_) => {
                vec!["ファイルのパーミッションを確認してください"]
            }
            Self::CommandFailed { stage, .. } => match stage {
                ReleaseStage::PublishLibs | ReleaseStage::PublishCli => vec![
                    "npm whoamiでログイン状態を確認してください",
                    "公開済みのパッケージを確認し、残りを手動で公開してください",
                ],
                ReleaseStage::CommitTagPush => vec![
                    "git statusで作業ツリーの状態を確認してください",
                    "リモートへのプッシュ権限を確認してください",
                ],
                _ => vec![
                    "コマンドの出力を確認してください",
                    "--keep-goingオプションで失敗を無視して続行できます",
                ],
            },
            Self::Command { .. } => vec![
                "npmとgitがPATHにインストールされているか確認してください",
                "--rootオプションで指定したディレクトリを確認してください",
            ],
            Self::Aborted => vec!["準備ができたら再度実行してください"],
            Self::Interrupted { .. } => vec![
                "ルートのpackage.jsonは元に戻されています",
                "公開済みのパッケージを確認し、残りを手動で公開してください",
            ],
            Self::Stage { .. } => vec!["バグの可能性があります。ログを添えて報告してください"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::ManifestParse { .. } => "MANIFEST_PARSE",
            Self::ManifestWrite { .. } => "MANIFEST_WRITE",
            Self::DeployFile { .. } => "DEPLOY_FILE",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
            Self::Command { .. } => "COMMAND_ERROR",
            Self::Aborted => "ABORTED",
            Self::Interrupted { .. } => "INTERRUPTED",
            Self::Stage { .. } => "INVALID_STAGE",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
