//! タグ定義
//!
//! スタック内の全リソースに付与する共通タグを環境とサービス名から導出します。

use crate::PROJECT_NAME;
use bluegreen_config::EnvironmentConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STACK_NAME: &str = "stack-name";
pub const SERVICE: &str = "service";
pub const LOCATION: &str = "location";
pub const OWNER: &str = "owner";
pub const STAGE: &str = "stage";

/// スタック共通タグ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    pub stack_name: String,
    pub service: String,
    pub location: String,
    pub owner: String,
    pub stage: String,
}

impl TagSet {
    /// サービス名と環境からタグを生成
    pub fn new(service_name: &str, env: &EnvironmentConfig) -> Self {
        Self {
            stack_name: format!(
                "{}-{}-{}-{}",
                env.pattern, PROJECT_NAME, env.stage, service_name
            ),
            service: service_name.to_string(),
            location: env.pattern.clone(),
            owner: env.owner.clone(),
            stage: env.stage.clone(),
        }
    }

    /// タグキー → 値のマップに変換
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (STACK_NAME.to_string(), self.stack_name.clone()),
            (SERVICE.to_string(), self.service.clone()),
            (LOCATION.to_string(), self.location.clone()),
            (OWNER.to_string(), self.owner.clone()),
            (STAGE.to_string(), self.stage.clone()),
        ])
    }
}
