//! デプロイ先環境の解決
//!
//! プロセスの環境変数と .env ファイルから [`EnvironmentConfig`] を組み立てます。
//! 環境はエントリーポイントで一度だけ解決され、以降は参照で各スタック定義に渡されます。

pub mod dotenv;
pub mod error;

pub use error::*;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

pub const ACCOUNT_KEY: &str = "AWS_ACCOUNT_ID";
pub const REGION_KEY: &str = "AWS_REGION";
pub const REGION_FALLBACK_KEY: &str = "AWS_DEFAULT_REGION";
pub const STAGE_KEY: &str = "STAGE";
pub const PATTERN_KEY: &str = "PATTERN";
pub const OWNER_KEY: &str = "OWNER";

static ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{12}$").expect("account pattern is valid"));
static REGION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("region pattern is valid"));
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("label pattern is valid"));
/// 命名パターンはリソース名の先頭セグメントになるためハイフン不可
static PATTERN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("naming pattern is valid"));

/// デプロイ先環境
///
/// アカウント、リージョン、ステージ名、命名パターン、オーナーを保持する不変の値。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// AWS アカウントID（12桁）
    pub account: String,
    /// リージョン（ap-northeast-1 など）
    pub region: String,
    /// ステージ名（test, prod など）
    pub stage: String,
    /// 命名パターン（dev, stg など）。リソース名の先頭と location タグに使用
    pub pattern: String,
    /// オーナー
    pub owner: String,
}

impl EnvironmentConfig {
    /// キー検索関数から環境を組み立てる
    ///
    /// 不足しているキーはまとめて報告する。値の検証もここで行う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let account = get(ACCOUNT_KEY);
        let region = get(REGION_KEY).or_else(|| get(REGION_FALLBACK_KEY));
        let stage = get(STAGE_KEY);
        let pattern = get(PATTERN_KEY);
        let owner = get(OWNER_KEY);

        let mut missing = Vec::new();
        for (key, value) in [
            (ACCOUNT_KEY, &account),
            (REGION_KEY, &region),
            (STAGE_KEY, &stage),
            (PATTERN_KEY, &pattern),
            (OWNER_KEY, &owner),
        ] {
            if value.is_none() {
                missing.push(key.to_string());
            }
        }

        match (account, region, stage, pattern, owner) {
            (Some(account), Some(region), Some(stage), Some(pattern), Some(owner)) => {
                let env = Self {
                    account,
                    region,
                    stage,
                    pattern,
                    owner,
                };
                env.validate()?;
                Ok(env)
            }
            _ if missing.len() == 1 => Err(ConfigError::MissingVariable(missing.remove(0))),
            _ => Err(ConfigError::MissingVariables(missing)),
        }
    }

    /// 変数マップから環境を組み立てる
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn validate(&self) -> Result<()> {
        check(ACCOUNT_KEY, &self.account, &ACCOUNT_RE, "12桁の数字である必要があります")?;
        check(
            REGION_KEY,
            &self.region,
            &REGION_RE,
            "ap-northeast-1 のような AWS リージョン名である必要があります",
        )?;
        check(
            STAGE_KEY,
            &self.stage,
            &LABEL_RE,
            "英小文字・数字・ハイフンのみ使用できます",
        )?;
        check(
            PATTERN_KEY,
            &self.pattern,
            &PATTERN_RE,
            "英小文字・数字のみ使用できます（ハイフン不可）",
        )?;
        Ok(())
    }

    /// `aws://{account}/{region}` 形式の環境識別子
    pub fn target(&self) -> String {
        format!("aws://{}/{}", self.account, self.region)
    }
}

fn check(key: &str, value: &str, re: &Regex, reason: &str) -> Result<()> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// 環境を解決
///
/// 優先順位（後のものが優先）:
/// 1. .env ファイル（[`dotenv::find_env_file`] で発見したもの）
/// 2. プロセスの環境変数
#[tracing::instrument]
pub fn resolve_environment() -> Result<EnvironmentConfig> {
    let mut vars = match dotenv::find_env_file()? {
        Some(path) => dotenv::load_env_file(&path)?,
        None => {
            debug!("No .env file found, using process environment only");
            HashMap::new()
        }
    };

    for key in [
        ACCOUNT_KEY,
        REGION_KEY,
        REGION_FALLBACK_KEY,
        STAGE_KEY,
        PATTERN_KEY,
        OWNER_KEY,
    ] {
        if let Ok(value) = std::env::var(key) {
            vars.insert(key.to_string(), value);
        }
    }

    let env = EnvironmentConfig::from_map(&vars)?;
    info!(
        pattern = %env.pattern,
        stage = %env.stage,
        target = %env.target(),
        "Resolved environment"
    );
    Ok(env)
}
