use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 環境変数キー（解決に使われるもの全て）
const ENV_KEYS: [&str; 7] = [
    "AWS_ACCOUNT_ID",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "STAGE",
    "PATTERN",
    "OWNER",
    "BLUEGREEN_ENV_FILE",
];

/// 外部の .env やホームディレクトリの設定から隔離された作業ディレクトリ
pub struct TestWorkspace {
    pub root: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    #[allow(dead_code)]
    pub fn write_env_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// 環境変数を消した状態の bluegreen コマンド
    #[allow(deprecated)]
    pub fn bare_command(&self) -> Command {
        let mut cmd = Command::cargo_bin("bluegreen").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.join(".config"))
            .env_remove("BLUEGREEN_OUTPUT")
            .env_remove("BLUEGREEN_FORMAT")
            .env_remove("RUST_LOG");
        for key in ENV_KEYS {
            cmd.env_remove(key);
        }
        cmd
    }

    /// dev/test 環境を設定した bluegreen コマンド
    #[allow(dead_code)]
    pub fn command(&self) -> Command {
        let mut cmd = self.bare_command();
        cmd.env("AWS_ACCOUNT_ID", "123456789012")
            .env("AWS_REGION", "ap-northeast-1")
            .env("STAGE", "test")
            .env("PATTERN", "dev")
            .env("OWNER", "ops");
        cmd
    }
}
