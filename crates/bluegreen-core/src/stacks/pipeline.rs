//! デプロイパイプラインスタック
//!
//! インフラ用リポジトリの master ブランチから構成を再合成し、
//! イメージビルドスタックとネットワーク・コンピュートスタックを1つのステージとしてデプロイする。

use super::{BuildImageStack, BuildWiring, EcsBlueGreenStack, VariantCounts};
use crate::error::Result;
use crate::model::*;
use crate::stack::{App, Stack, Stage};
use crate::tags::TagSet;
use bluegreen_config::EnvironmentConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub const INFRA_PREFIX: &str = "ecs-blue-green-deployments-infra";
pub const PIPELINE_STACK_ID: &str = "ecs-blue-green-deployments-pipeline";
pub const BUILD_IMAGE_STACK_ID: &str = "simflexcloud-ecs-blue-green-deployments-build-image";
pub const ECS_STACK_ID: &str = "EcsBlueGreenDeploymentsStack";
/// ステージ内スタックのタグに使うサービス名
pub const STAGE_SERVICE_NAME: &str = "build-image";
pub const PIPELINE_SERVICE_NAME: &str = "pipeline";
pub const DEFAULT_OUTPUT_DIR: &str = "cdk.out";

/// デプロイパイプラインの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// ソースブランチ
    pub branch: String,
    pub counts: VariantCounts,
    pub wiring: BuildWiring,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            branch: "master".to_string(),
            counts: VariantCounts::default(),
            wiring: BuildWiring::default(),
        }
    }
}

pub struct DeploymentPipelineStack;

impl DeploymentPipelineStack {
    /// パイプラインスタックとデプロイ対象ステージからなるアプリを組み立てる
    #[instrument(skip(env), fields(pattern = %env.pattern, stage = %env.stage))]
    pub fn build(env: &EnvironmentConfig, options: &PipelineOptions) -> Result<App> {
        let stage = Self::stage(env, options)?;

        let mut stack = Stack::new(
            PIPELINE_STACK_ID,
            env,
            TagSet::new(PIPELINE_SERVICE_NAME, env),
        )
        .with_description("ECS blue/green deployments: self-updating deployment pipeline");

        let repository = stack.declare(
            INFRA_PREFIX,
            CodeCommitRepository {
                repository_name: INFRA_PREFIX.to_string(),
                repository_description: INFRA_PREFIX.to_string(),
            },
        )?;

        let pipeline_name = format!("{INFRA_PREFIX}-{}", options.branch);
        stack.declare(
            pipeline_name.clone(),
            DeploymentPipeline {
                pipeline_name,
                source: PipelineSource {
                    repository,
                    branch: options.branch.clone(),
                },
                synth: SynthStep {
                    name: "SynthStep".to_string(),
                    install_commands: vec!["rustup default stable".to_string()],
                    commands: vec![
                        "cargo build --release --locked".to_string(),
                        format!("./target/release/bluegreen synth --output {DEFAULT_OUTPUT_DIR}"),
                    ],
                    primary_output_directory: DEFAULT_OUTPUT_DIR.to_string(),
                },
                self_mutation: true,
                use_change_sets: false,
                docker_enabled_for_synth: true,
                docker_enabled_for_self_mutation: true,
                code_build_defaults: CodeBuildDefaults {
                    privileged: true,
                    cache_paths: vec!["${CODEBUILD_SRC_DIR}/target/**/*".to_string()],
                },
                stages: vec![StageDeployment {
                    stage_id: stage.id.clone(),
                    environment: env.target(),
                    stacks: stage.stacks().iter().map(|s| s.id.clone()).collect(),
                }],
            },
        )?;

        let mut app = App::new();
        app.add_stack(stack)?;
        app.add_stage(stage)?;

        info!(
            stacks = app.all_stacks().count(),
            branch = %options.branch,
            "Composed deployment pipeline"
        );
        Ok(app)
    }

    /// `{branch}-{pattern}` ステージ
    fn stage(env: &EnvironmentConfig, options: &PipelineOptions) -> Result<Stage> {
        let mut stage = Stage::new(format!("{}-{}", options.branch, env.pattern), env);

        stage.add_stack(BuildImageStack::build(
            BUILD_IMAGE_STACK_ID,
            env,
            TagSet::new(STAGE_SERVICE_NAME, env),
            options.wiring,
        )?)?;
        stage.add_stack(EcsBlueGreenStack::build(
            ECS_STACK_ID,
            env,
            TagSet::new(STAGE_SERVICE_NAME, env),
            &options.counts,
        )?)?;

        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvironmentConfig {
        EnvironmentConfig {
            account: "123456789012".to_string(),
            region: "ap-northeast-1".to_string(),
            stage: "test".to_string(),
            pattern: "dev".to_string(),
            owner: "ops".to_string(),
        }
    }

    fn app() -> App {
        DeploymentPipelineStack::build(&env(), &PipelineOptions::default()).unwrap()
    }

    fn deployment_pipeline(app: &App) -> &DeploymentPipeline {
        deployment_pipeline_named(app, "ecs-blue-green-deployments-infra-master")
    }

    fn deployment_pipeline_named<'a>(app: &'a App, construct_id: &str) -> &'a DeploymentPipeline {
        let stack = &app.stacks()[0];
        match &stack.find(construct_id).unwrap().kind {
            ResourceKind::DeploymentPipeline(p) => p,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stage_composition() {
        let app = app();
        assert_eq!(app.stacks().len(), 1);
        assert_eq!(app.stacks()[0].id, PIPELINE_STACK_ID);

        let stage = app.stage("master-dev").unwrap();
        let ids: Vec<&str> = stage.stacks().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![BUILD_IMAGE_STACK_ID, ECS_STACK_ID]);
    }

    #[test]
    fn test_stage_stacks_share_environment_and_tags() {
        let app = app();
        let stage = app.stage("master-dev").unwrap();
        let expected = TagSet::new("build-image", &env());
        for stack in stage.stacks() {
            assert_eq!(stack.env, env());
            assert_eq!(stack.tags, expected);
            assert_eq!(stack.tags.stack_name, "dev-simflexcloud-test-build-image");
        }
    }

    #[test]
    fn test_pipeline_declaration() {
        let app = app();
        let pipeline = deployment_pipeline(&app);

        assert_eq!(pipeline.pipeline_name, "ecs-blue-green-deployments-infra-master");
        assert_eq!(pipeline.source.branch, "master");
        assert!(!pipeline.use_change_sets);
        assert!(pipeline.self_mutation);
        assert!(pipeline.docker_enabled_for_synth);
        assert!(pipeline.code_build_defaults.privileged);
        assert_eq!(pipeline.synth.name, "SynthStep");
        assert!(
            pipeline
                .synth
                .commands
                .iter()
                .any(|c| c.contains("bluegreen synth"))
        );
        assert_eq!(pipeline.stages[0].stage_id, "master-dev");
        assert_eq!(pipeline.stages[0].environment, "aws://123456789012/ap-northeast-1");
        assert_eq!(
            pipeline.stages[0].stacks,
            vec![BUILD_IMAGE_STACK_ID.to_string(), ECS_STACK_ID.to_string()]
        );
    }

    #[test]
    fn test_options_flow_into_stage() {
        let options = PipelineOptions {
            counts: VariantCounts { blue: 2, green: 0 },
            wiring: BuildWiring::Direct,
            ..Default::default()
        };
        let app = DeploymentPipelineStack::build(&env(), &options).unwrap();
        let ecs = app.stage("master-dev").unwrap().stack(ECS_STACK_ID).unwrap();

        let blue = ecs
            .find("dev-simflexcloud-test-ecs-blue-green-deployments-ec2-blue-service")
            .unwrap();
        match &blue.kind {
            ResourceKind::Ec2Service(s) => assert_eq!(s.desired_count, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_branch_is_not_a_template() {
        let options = PipelineOptions {
            branch: "release-{{x}}".to_string(),
            ..Default::default()
        };
        let app = DeploymentPipelineStack::build(&env(), &options).unwrap();
        assert!(app.stage("release-{{x}}-dev").is_some());
        assert_eq!(
            deployment_pipeline_named(&app, "ecs-blue-green-deployments-infra-release-{{x}}")
                .source
                .branch,
            "release-{{x}}"
        );
    }

    #[test]
    fn test_app_validates() {
        app().validate().unwrap();
    }
}
