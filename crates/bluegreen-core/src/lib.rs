//! ECS blue/green デプロイ構成のコア
//!
//! 環境からタグと名前を導出し、3つのスタック定義を組み立てます。
//!
//! ```text
//! EnvironmentConfig ──► DeploymentPipelineStack ──► App
//!                               │
//!                               ├─ pipeline stack
//!                               └─ Stage "master-{pattern}"
//!                                    ├─ BuildImageStack
//!                                    └─ EcsBlueGreenStack
//! ```

pub mod error;
pub mod model;
pub mod naming;
pub mod stack;
pub mod stacks;
pub mod tags;

pub use error::{Result, SynthError};
pub use naming::Naming;
pub use stack::{App, Import, Stack, Stage};
pub use stacks::{
    BuildImageStack, BuildWiring, DeploymentPipelineStack, EcsBlueGreenStack, PipelineOptions,
    Variant, VariantCounts,
};
pub use tags::TagSet;

pub use bluegreen_config::EnvironmentConfig;

/// プロジェクト名（リソース名とタグに使用）
pub const PROJECT_NAME: &str = "simflexcloud";
/// アプリケーション名
pub const APP_NAME: &str = "ecs-blue-green-deployments";

/// 環境からデプロイ構成全体を合成
///
/// 全スタックの参照を検証してから返す。
pub fn synthesize(env: &EnvironmentConfig, options: &PipelineOptions) -> Result<App> {
    let app = DeploymentPipelineStack::build(env, options)?;
    app.validate()?;
    Ok(app)
}
