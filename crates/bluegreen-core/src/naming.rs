//! リソース命名
//!
//! Tera テンプレートで環境からリソース名のプレフィックスを生成します。
//! 同じ `(pattern, stage)` からは常に同じ名前が得られ、どちらかが異なれば名前も異なります。

use crate::error::{Result, SynthError};
use crate::{APP_NAME, PROJECT_NAME};
use bluegreen_config::EnvironmentConfig;
use tera::{Context, Tera};

/// ネットワーク・コンピュートスタックのプレフィックス
pub const ECS_PREFIX_TEMPLATE: &str = "{{ pattern }}-{{ project }}-{{ stage }}-{{ app }}";
/// イメージビルドスタックのプレフィックス
pub const BUILD_PREFIX_TEMPLATE: &str = "{{ pattern }}-{{ stage }}-{{ project }}-{{ app }}";
/// ECR リポジトリ名
pub const REPOSITORY_TEMPLATE: &str = "{{ project }}/{{ app }}";

/// 環境に束縛された命名器
pub struct Naming {
    context: Context,
}

impl Naming {
    pub fn new(env: &EnvironmentConfig) -> Self {
        let mut context = Context::new();
        context.insert("pattern", &env.pattern);
        context.insert("stage", &env.stage);
        context.insert("account", &env.account);
        context.insert("region", &env.region);
        context.insert("project", PROJECT_NAME);
        context.insert("app", APP_NAME);
        Self { context }
    }

    /// 任意のテンプレートを展開
    pub fn render(&self, template: &str) -> Result<String> {
        Tera::one_off(template, &self.context, false).map_err(|e| SynthError::Template {
            template: template.to_string(),
            message: tera_error_detail(&e),
        })
    }

    pub fn ecs_prefix(&self) -> Result<String> {
        self.render(ECS_PREFIX_TEMPLATE)
    }

    pub fn build_prefix(&self) -> Result<String> {
        self.render(BUILD_PREFIX_TEMPLATE)
    }

    pub fn repository_name(&self) -> Result<String> {
        self.render(REPOSITORY_TEMPLATE)
    }
}

/// Teraのエラーチェーンから原因を連結
fn tera_error_detail(e: &tera::Error) -> String {
    let mut detail = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

/// コンストラクトIDから論理IDを導出
///
/// 英数字以外で区切り、各セグメントの先頭を大文字にして連結する。
/// `dev-simflexcloud-test-vpc` → `DevSimflexcloudTestVpc`
pub fn logical_id(construct_id: &str) -> Result<String> {
    let id: String = construct_id
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if id.is_empty() {
        return Err(SynthError::InvalidIdentifier(construct_id.to_string()));
    }
    Ok(id)
}
