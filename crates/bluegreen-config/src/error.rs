use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("必須の環境変数が設定されていません: {0}")]
    MissingVariable(String),

    #[error(
        "必須の環境変数が設定されていません: {}\n\
        .env ファイル、または BLUEGREEN_ENV_FILE で指定したファイルを確認してください",
        .0.join(", ")
    )]
    MissingVariables(Vec<String>),

    #[error("環境変数 {key} の値が不正です: '{value}'\n理由: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error(".env ファイルの読み込みに失敗しました: {path}\n理由: {message}")]
    EnvFile { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
