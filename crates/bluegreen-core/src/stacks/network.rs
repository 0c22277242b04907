//! ネットワーク・コンピュートスタック
//!
//! VPC、セキュリティグループ、Auto Scaling グループ、ECS クラスター、
//! blue/green 2系統のタスク定義とサービス、両サービスに振り分ける ALB を宣言します。
//!
//! 2つのサービスは同じターゲットグループに常に登録され、トラフィックの配分は
//! desired count の比で決まります。切り替えは desired count を外部から変更して行います。

use super::{Variant, VariantCounts};
use crate::error::Result;
use crate::model::*;
use crate::naming::Naming;
use crate::stack::Stack;
use crate::tags::TagSet;
use bluegreen_config::EnvironmentConfig;
use tracing::{info, instrument};

pub const LISTENER_PORT: u16 = 80;
pub const CONTAINER_PORT: u16 = 8081;
pub const HEALTH_CHECK_PATH: &str = "/api/";
pub const LOAD_BALANCER_NAME: &str = "ecs-blue-green-deployments";
pub const INSTANCE_TYPE: &str = "t3a.medium";
const TASK_CPU: &str = "128";
const TASK_MEMORY_MIB: u32 = 256;

pub struct EcsBlueGreenStack;

impl EcsBlueGreenStack {
    #[instrument(skip(env, tags), fields(pattern = %env.pattern, stage = %env.stage))]
    pub fn build(
        id: &str,
        env: &EnvironmentConfig,
        tags: TagSet,
        counts: &VariantCounts,
    ) -> Result<Stack> {
        let naming = Naming::new(env);
        let prefix = naming.ecs_prefix()?;
        let mut stack = Stack::new(id, env, tags)
            .with_description("ECS blue/green deployments: network and compute");

        // IAM
        let ec2_role = stack.declare(
            format!("{prefix}-ec2-role"),
            Role::assumed_by(format!("{prefix}-ec2"), "ec2.amazonaws.com")
                .with_managed_policy("service-role/AmazonEC2ContainerServiceforEC2Role")
                .with_managed_policy("AmazonSSMManagedInstanceCore"),
        )?;
        let ecs_role = stack.declare(
            format!("{prefix}-ecs-role"),
            Role::assumed_by(format!("{prefix}-ecs-task"), "ecs-tasks.amazonaws.com")
                .with_managed_policy("service-role/AmazonECSTaskExecutionRolePolicy"),
        )?;

        // ネットワーク
        let vpc = stack.declare(format!("{prefix}-vpc"), Vpc::new(prefix.clone(), 2, 1))?;

        let ec2_sg = stack.declare(
            format!("{prefix}-ec2-sg"),
            SecurityGroup {
                group_name: format!("{prefix}-ec2"),
                group_description: format!("{prefix}-ec2"),
                vpc_id: vpc.clone(),
                allow_all_outbound: true,
            },
        )?;
        let alb_sg = stack.declare(
            format!("{prefix}-alb-sg"),
            SecurityGroup {
                group_name: format!("{prefix}-alb"),
                group_description: format!("{prefix}-alb"),
                vpc_id: vpc.clone(),
                allow_all_outbound: true,
            },
        )?;
        stack.declare(
            format!("{prefix}-ec2-sg-from-alb"),
            SecurityGroupIngress::all_traffic_from(
                &ec2_sg,
                &alb_sg,
                "Allow all traffic from the same security group",
            ),
        )?;

        // コンピュート
        let asg = stack.declare(
            format!("{prefix}-asg"),
            AutoScalingGroup {
                auto_scaling_group_name: prefix.clone(),
                min_size: 1,
                max_size: 1,
                instance_type: INSTANCE_TYPE.to_string(),
                image_id: MachineImage::EcsOptimizedAmazonLinux2,
                security_groups: vec![ec2_sg.attr("GroupId")],
                instance_role: ec2_role,
                vpc: vpc.clone(),
            },
        )?;

        let alb = stack.declare(
            format!("{prefix}-alb"),
            LoadBalancer {
                name: LOAD_BALANCER_NAME.to_string(),
                scheme: LoadBalancerScheme::InternetFacing,
                load_balancer_type: "application".to_string(),
                security_groups: vec![alb_sg.attr("GroupId")],
                vpc: vpc.clone(),
            },
        )?;

        let cluster = stack.declare(
            format!("{prefix}-cluster"),
            Cluster {
                cluster_name: prefix.clone(),
                vpc: vpc.clone(),
            },
        )?;

        let provider = stack.declare(
            format!("{prefix}-asg-capacity-provider"),
            CapacityProvider {
                name: format!("{prefix}-asg-capacity-provider"),
                auto_scaling_group_provider: AutoScalingGroupProvider {
                    auto_scaling_group_arn: asg,
                    managed_scaling: Toggle::Disabled,
                    managed_termination_protection: Toggle::Disabled,
                },
            },
        )?;
        stack.declare(
            format!("{prefix}-cluster-capacity-providers"),
            CapacityProviderAssociations {
                cluster: cluster.clone(),
                capacity_providers: vec![provider],
            },
        )?;

        // 既存の ECR リポジトリ（イメージビルドスタックで作成）
        let ecr = stack.import(
            &format!("{prefix}-ecr"),
            "AWS::ECR::Repository",
            naming.repository_name()?,
        )?;

        // blue / green のタスク定義
        let blue_task = stack.declare(
            format!("{prefix}-task-definition-blue"),
            task_definition(&prefix, Variant::Blue, &ecr, &ecs_role),
        )?;
        let green_task = stack.declare(
            format!("{prefix}-task-definition-green"),
            task_definition(&prefix, Variant::Green, &ecr, &ecs_role),
        )?;

        let green_service = stack.declare(
            format!("{prefix}-ec2-green-service"),
            service(&prefix, Variant::Green, &cluster, green_task, counts),
        )?;
        let blue_service = stack.declare(
            format!("{prefix}-ec2-blue-service"),
            service(&prefix, Variant::Blue, &cluster, blue_task, counts),
        )?;

        // ALB: ポート80で両サービスへ転送
        let target_group = stack.declare(
            format!("{prefix}-target-80"),
            TargetGroup {
                port: LISTENER_PORT,
                protocol: ApplicationProtocol::Http,
                vpc_id: vpc,
                target_type: "instance".to_string(),
                health_check_path: HEALTH_CHECK_PATH.to_string(),
                targets: vec![green_service, blue_service],
            },
        )?;
        stack.declare(
            format!("{prefix}-listener-80"),
            Listener {
                load_balancer_arn: alb,
                port: LISTENER_PORT,
                protocol: ApplicationProtocol::Http,
                open: true,
                default_actions: vec![ListenerAction::forward(target_group)],
            },
        )?;

        info!(
            stack = %stack.id,
            resources = stack.len(),
            blue = counts.blue,
            green = counts.green,
            "Declared network and compute stack"
        );
        Ok(stack)
    }
}

fn service(
    prefix: &str,
    variant: Variant,
    cluster: &Ref,
    task_definition: Ref,
    counts: &VariantCounts,
) -> Ec2Service {
    Ec2Service {
        service_name: format!("{prefix}-svc-{variant}"),
        cluster: cluster.clone(),
        task_definition,
        desired_count: counts.get(variant),
        launch_type: "EC2".to_string(),
    }
}

fn task_definition(
    prefix: &str,
    variant: Variant,
    ecr: &Ref,
    execution_role: &Ref,
) -> TaskDefinition {
    TaskDefinition {
        requires_compatibilities: vec![Compatibility::Ec2],
        network_mode: "bridge".to_string(),
        cpu: TASK_CPU.to_string(),
        memory: TASK_MEMORY_MIB.to_string(),
        execution_role_arn: execution_role.attr("Arn"),
        container_definitions: vec![ContainerDefinition {
            name: format!("{prefix}-{variant}-container"),
            image: EcrImage {
                repository: ecr.clone(),
                tag: variant.image_tag().to_string(),
            },
            memory: TASK_MEMORY_MIB,
            essential: true,
            port_mappings: vec![PortMapping {
                container_port: CONTAINER_PORT,
                host_port: 0,
                protocol: Protocol::Tcp,
                name: format!("ecs-{variant}-container-{CONTAINER_PORT}-tcp"),
                app_protocol: AppProtocol::Http,
            }],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "dev-simflexcloud-test-ecs-blue-green-deployments";

    fn env() -> EnvironmentConfig {
        EnvironmentConfig {
            account: "123456789012".to_string(),
            region: "ap-northeast-1".to_string(),
            stage: "test".to_string(),
            pattern: "dev".to_string(),
            owner: "ops".to_string(),
        }
    }

    fn build(counts: VariantCounts) -> Stack {
        let e = env();
        EcsBlueGreenStack::build("EcsBlueGreenDeploymentsStack", &e, TagSet::new("build-image", &e), &counts)
            .unwrap()
    }

    fn find<'a>(stack: &'a Stack, suffix: &str) -> &'a ResourceKind {
        &stack
            .find(&format!("{PREFIX}-{suffix}"))
            .unwrap_or_else(|| panic!("{suffix} not declared"))
            .kind
    }

    fn target_group(stack: &Stack) -> &TargetGroup {
        match find(stack, "target-80") {
            ResourceKind::TargetGroup(tg) => tg,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn service<'a>(stack: &'a Stack, variant: &str) -> &'a Ec2Service {
        match find(stack, &format!("ec2-{variant}-service")) {
            ResourceKind::Ec2Service(s) => s,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_listener_targets_both_services() {
        let stack = build(VariantCounts::default());
        let tg = target_group(&stack);

        let green = stack.find(&format!("{PREFIX}-ec2-green-service")).unwrap();
        let blue = stack.find(&format!("{PREFIX}-ec2-blue-service")).unwrap();
        assert_eq!(
            tg.targets,
            vec![Ref::new(&green.logical_id), Ref::new(&blue.logical_id)]
        );
        assert_eq!(tg.health_check_path, "/api/");
        assert_eq!(tg.port, 80);
    }

    #[test]
    fn test_targets_independent_of_desired_count() {
        for (blue, green) in [(0, 2), (2, 0), (0, 0), (3, 1)] {
            let stack = build(VariantCounts { blue, green });
            assert_eq!(target_group(&stack).targets.len(), 2);
            assert_eq!(service(&stack, "blue").desired_count, blue);
            assert_eq!(service(&stack, "green").desired_count, green);
        }
    }

    #[test]
    fn test_default_counts() {
        let stack = build(VariantCounts::default());
        assert_eq!(service(&stack, "blue").desired_count, 0);
        assert_eq!(service(&stack, "green").desired_count, 2);
        assert_eq!(service(&stack, "blue").service_name, format!("{PREFIX}-svc-blue"));
    }

    #[test]
    fn test_listener_forwards_to_target_group() {
        let stack = build(VariantCounts::default());
        let tg_id = &stack.find(&format!("{PREFIX}-target-80")).unwrap().logical_id;
        match find(&stack, "listener-80") {
            ResourceKind::Listener(listener) => {
                assert_eq!(listener.port, 80);
                assert!(listener.open);
                assert_eq!(listener.default_actions[0].target_group_arn, Ref::new(tg_id));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_task_definitions_use_distinct_tags() {
        let stack = build(VariantCounts::default());
        for (variant, tag) in [("blue", "testblue"), ("green", "testgreen")] {
            match find(&stack, &format!("task-definition-{variant}")) {
                ResourceKind::TaskDefinition(td) => {
                    assert_eq!(td.cpu, "128");
                    assert_eq!(td.memory, "256");
                    let container = &td.container_definitions[0];
                    assert_eq!(container.image.tag, tag);
                    assert_eq!(container.name, format!("{PREFIX}-{variant}-container"));
                    let port = &container.port_mappings[0];
                    assert_eq!(port.container_port, 8081);
                    assert_eq!(port.host_port, 0);
                    assert_eq!(port.name, format!("ecs-{variant}-container-8081-tcp"));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_registry_is_imported_not_created() {
        let stack = build(VariantCounts::default());
        assert!(
            !stack
                .resources()
                .iter()
                .any(|r| r.type_name() == "AWS::ECR::Repository")
        );
        let import = &stack.imports()[0];
        assert_eq!(import.name, "simflexcloud/ecs-blue-green-deployments");
    }

    #[test]
    fn test_ingress_from_alb_to_ec2() {
        let stack = build(VariantCounts::default());
        let ec2_sg = &stack.find(&format!("{PREFIX}-ec2-sg")).unwrap().logical_id;
        let alb_sg = &stack.find(&format!("{PREFIX}-alb-sg")).unwrap().logical_id;
        match find(&stack, "ec2-sg-from-alb") {
            ResourceKind::SecurityGroupIngress(rule) => {
                assert_eq!(rule.group_id.target.0, *ec2_sg);
                assert_eq!(rule.source_security_group_id.target.0, *alb_sg);
                assert_eq!(rule.ip_protocol, "-1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_asg_fixed_capacity() {
        let stack = build(VariantCounts::default());
        match find(&stack, "asg") {
            ResourceKind::AutoScalingGroup(asg) => {
                assert_eq!(asg.min_size, 1);
                assert_eq!(asg.max_size, 1);
                assert_eq!(asg.instance_type, "t3a.medium");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_declaration_order_and_validity() {
        let stack = build(VariantCounts::default());
        stack.validate().unwrap();

        let order: Vec<&str> = stack.resources().iter().map(|r| r.type_name()).collect();
        let pos = |t: &str| order.iter().position(|x| *x == t).unwrap();
        assert!(pos("AWS::EC2::VPC") < pos("AWS::EC2::SecurityGroup"));
        assert!(pos("AWS::EC2::SecurityGroup") < pos("AWS::EC2::SecurityGroupIngress"));
        assert!(pos("AWS::AutoScaling::AutoScalingGroup") < pos("AWS::ECS::CapacityProvider"));
        assert!(pos("AWS::ECS::TaskDefinition") < pos("AWS::ECS::Service"));
        assert!(pos("AWS::ECS::Service") < pos("AWS::ElasticLoadBalancingV2::TargetGroup"));
    }
}
