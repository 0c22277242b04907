//! コンテナレジストリ、ソースリポジトリ、ビルド、パイプライン

use super::{GetAtt, Ref};
use serde::Serialize;

/// CodeBuild 標準イメージ 7.0
pub const STANDARD_7_0: &str = "aws/codebuild/standard:7.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EcrRepository {
    pub repository_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeCommitRepository {
    pub repository_name: String,
    pub repository_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildProject {
    pub name: String,
    pub description: String,
    pub service_role: GetAtt,
    pub source: BuildSource,
    pub artifacts: BuildArtifacts,
    pub environment: BuildEnvironment,
}

/// パイプラインから渡されたソースを buildspec ファイルでビルド
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildSource {
    #[serde(rename = "Type")]
    pub source_type: String,
    pub build_spec: String,
}

impl BuildSource {
    pub fn pipeline(build_spec: impl Into<String>) -> Self {
        Self {
            source_type: "CODEPIPELINE".to_string(),
            build_spec: build_spec.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildArtifacts {
    #[serde(rename = "Type")]
    pub artifacts_type: String,
}

impl BuildArtifacts {
    pub fn pipeline() -> Self {
        Self {
            artifacts_type: "CODEPIPELINE".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildEnvironment {
    #[serde(rename = "Type")]
    pub environment_type: String,
    pub compute_type: String,
    pub image: String,
    pub privileged_mode: bool,
    pub environment_variables: Vec<BuildVariable>,
}

impl BuildEnvironment {
    /// Docker ビルド用（privileged）の Linux 環境
    pub fn linux_privileged(image: &str, environment_variables: Vec<BuildVariable>) -> Self {
        Self {
            environment_type: "LINUX_CONTAINER".to_string(),
            compute_type: "BUILD_GENERAL1_SMALL".to_string(),
            image: image.to_string(),
            privileged_mode: true,
            environment_variables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildVariable {
    pub name: String,
    pub value: String,
    #[serde(rename = "Type")]
    pub variable_type: String,
}

impl BuildVariable {
    pub fn plaintext(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            variable_type: "PLAINTEXT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pipeline {
    pub name: String,
    pub stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// 指定ステージのアクション一覧
    pub fn stage(&self, name: &str) -> Option<&PipelineStage> {
        self.stages.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineStage {
    pub name: String,
    pub actions: Vec<PipelineAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Provider")]
pub enum PipelineAction {
    #[serde(rename = "CodeCommit", rename_all = "PascalCase")]
    CodeCommitSource {
        name: String,
        repository: Ref,
        branch: String,
        output_artifact: String,
    },
    #[serde(rename = "CodeBuild", rename_all = "PascalCase")]
    CodeBuild {
        name: String,
        project: Ref,
        input_artifact: String,
    },
}
