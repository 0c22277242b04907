//! .env ファイルの探索と読み込み

use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// .env ファイルのパスを直接指定する環境変数
pub const ENV_FILE_VAR: &str = "BLUEGREEN_ENV_FILE";

/// .env ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 BLUEGREEN_ENV_FILE (直接パス指定)
/// 2. カレントディレクトリ: .env.local, .env
/// 3. ~/.config/bluegreen/.env (グローバル設定)
///
/// 見つからない場合は `None`（.env は任意）
pub fn find_env_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(path) = std::env::var(ENV_FILE_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::EnvFile {
            path,
            message: format!("{} で指定されたファイルが存在しません", ENV_FILE_VAR),
        });
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in [".env.local", ".env"] {
        let path = current_dir.join(filename);
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    // 3. グローバル設定 (~/.config/bluegreen/.env)
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("bluegreen").join(".env");
        if global.is_file() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}

/// .env ファイルを読み込んで変数マップを返す
#[tracing::instrument]
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vars = parse_env(&content);
    info!(
        env_file = %path.display(),
        variable_count = vars.len(),
        "Loaded variables from .env file"
    );
    Ok(vars)
}

/// KEY=VALUE 形式の内容をパース
///
/// 空行と `#` で始まる行は無視。`export ` プレフィックスも受け付ける。
pub fn parse_env(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = strip_quotes(value.trim());
            debug!(key = %key, "Adding variable from .env file");
            vars.insert(key.to_string(), value.to_string());
        }
    }

    vars
}

/// クォートを除去（"value" や 'value' の場合）
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
