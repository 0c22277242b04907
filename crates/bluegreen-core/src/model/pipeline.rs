//! 自己更新デプロイパイプライン

use super::Ref;
use serde::Serialize;

/// ソースから構成を再合成し、自身とステージをデプロイするパイプライン
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentPipeline {
    pub pipeline_name: String,
    pub source: PipelineSource,
    pub synth: SynthStep,
    pub self_mutation: bool,
    pub use_change_sets: bool,
    pub docker_enabled_for_synth: bool,
    pub docker_enabled_for_self_mutation: bool,
    pub code_build_defaults: CodeBuildDefaults,
    pub stages: Vec<StageDeployment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineSource {
    pub repository: Ref,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SynthStep {
    pub name: String,
    pub install_commands: Vec<String>,
    pub commands: Vec<String>,
    pub primary_output_directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeBuildDefaults {
    pub privileged: bool,
    pub cache_paths: Vec<String>,
}

/// パイプラインがデプロイするステージ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StageDeployment {
    pub stage_id: String,
    pub environment: String,
    pub stacks: Vec<String>,
}
