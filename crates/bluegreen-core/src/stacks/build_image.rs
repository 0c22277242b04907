//! イメージビルドパイプラインスタック
//!
//! ECR リポジトリ、CodeCommit リポジトリ、CodeBuild ロール、
//! blue/green それぞれのビルドプロジェクトとパイプラインを宣言します。

use super::{BuildWiring, Variant};
use crate::error::Result;
use crate::model::*;
use crate::naming::Naming;
use crate::stack::Stack;
use crate::tags::TagSet;
use bluegreen_config::EnvironmentConfig;
use tracing::{info, instrument, warn};

pub const SOURCE_REPOSITORY_NAME: &str = "ecs-blue-green-deployments";
pub const BUILD_SPEC: &str = "./buildspec.yml";
pub const SOURCE_ARTIFACT: &str = "SourceOutput";

/// ECR への pull/push に必要なアクション
const ECR_PULL_PUSH_ACTIONS: [&str; 7] = [
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
    "ecr:PutImage",
    "ecr:InitiateLayerUpload",
    "ecr:UploadLayerPart",
    "ecr:CompleteLayerUpload",
];

pub struct BuildImageStack;

impl BuildImageStack {
    #[instrument(skip(env, tags), fields(pattern = %env.pattern, stage = %env.stage))]
    pub fn build(
        id: &str,
        env: &EnvironmentConfig,
        tags: TagSet,
        wiring: BuildWiring,
    ) -> Result<Stack> {
        let naming = Naming::new(env);
        let prefix = naming.build_prefix()?;
        let repository_name = naming.repository_name()?;
        let mut stack = Stack::new(id, env, tags)
            .with_description("ECS blue/green deployments: image build pipelines");

        let ecr = stack.add(
            Resource::new(
                format!("{prefix}-ecr"),
                EcrRepository {
                    repository_name: repository_name.clone(),
                },
            )?
            .with_deletion_policy(DeletionPolicy::Delete),
        )?;

        let repo = stack.declare(
            format!("{prefix}-repo"),
            CodeCommitRepository {
                repository_name: SOURCE_REPOSITORY_NAME.to_string(),
                repository_description: "ECS Blue/Green deployments".to_string(),
            },
        )?;

        let role = stack.declare(
            format!("{prefix}-codebuild-role"),
            Role::assumed_by(format!("{prefix}-codebuild"), "codebuild.amazonaws.com"),
        )?;
        stack.declare(
            format!("{prefix}-codebuild-role-ecr-pull-push"),
            Policy {
                policy_name: format!("{prefix}-codebuild-ecr-pull-push"),
                policy_document: PolicyDocument::new(vec![
                    PolicyStatement {
                        effect: Effect::Allow,
                        principal: None,
                        action: ECR_PULL_PUSH_ACTIONS.iter().map(|a| a.to_string()).collect(),
                        resource: vec![PolicyResource::Attribute(ecr.attr("Arn"))],
                    },
                    PolicyStatement {
                        effect: Effect::Allow,
                        principal: None,
                        action: vec!["ecr:GetAuthorizationToken".to_string()],
                        resource: vec![PolicyResource::Literal("*".to_string())],
                    },
                ]),
                roles: vec![role.clone()],
            },
        )?;

        // ビルドプロジェクト（green → blue の順で宣言）
        let green_project = stack.declare(
            format!("{prefix}-codebuild-green"),
            build_project(&prefix, Variant::Green, &repository_name, &role, env),
        )?;
        let blue_project = stack.declare(
            format!("{prefix}-codebuild-blue"),
            build_project(&prefix, Variant::Blue, &repository_name, &role, env),
        )?;
        let project = |variant: Variant| match variant {
            Variant::Blue => blue_project.clone(),
            Variant::Green => green_project.clone(),
        };

        if wiring == BuildWiring::Crossed {
            warn!(
                "Build pipelines are cross-wired: branch testblue builds the testgreen image and vice versa"
            );
        }

        // ブランチごとのパイプライン
        for branch in Variant::ALL {
            let target = wiring.project_for(branch);
            stack.declare(
                format!("{prefix}-build-image-{branch}"),
                Pipeline {
                    name: format!("{}-{prefix}", branch.image_tag()),
                    stages: vec![
                        PipelineStage {
                            name: "Source".to_string(),
                            actions: vec![PipelineAction::CodeCommitSource {
                                name: "CodeCommit".to_string(),
                                repository: repo.clone(),
                                branch: branch.image_tag().to_string(),
                                output_artifact: SOURCE_ARTIFACT.to_string(),
                            }],
                        },
                        PipelineStage {
                            name: "Build".to_string(),
                            actions: vec![PipelineAction::CodeBuild {
                                name: "CodeBuild".to_string(),
                                project: project(target),
                                input_artifact: SOURCE_ARTIFACT.to_string(),
                            }],
                        },
                    ],
                },
            )?;
        }

        info!(
            stack = %stack.id,
            resources = stack.len(),
            wiring = ?wiring,
            "Declared image build stack"
        );
        Ok(stack)
    }
}

fn build_project(
    prefix: &str,
    variant: Variant,
    repository_name: &str,
    role: &Ref,
    env: &EnvironmentConfig,
) -> BuildProject {
    BuildProject {
        name: format!("{prefix}-codebuild-{variant}"),
        description: format!("Pipeline for building {variant} docker image"),
        service_role: role.attr("Arn"),
        source: BuildSource::pipeline(BUILD_SPEC),
        artifacts: BuildArtifacts::pipeline(),
        environment: BuildEnvironment::linux_privileged(
            STANDARD_7_0,
            vec![
                BuildVariable::plaintext("IMAGE_REPO_NAME", repository_name),
                BuildVariable::plaintext("IMAGE_TAG", variant.image_tag()),
                BuildVariable::plaintext("AWS_ACCOUNT_ID", env.account.as_str()),
                BuildVariable::plaintext("AWS_DEFAULT_REGION", env.region.as_str()),
            ],
        ),
    }
}
