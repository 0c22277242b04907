//! ECS クラスター、タスク定義、サービス

use super::{GetAtt, Ref};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cluster {
    pub cluster_name: String,
    pub vpc: Ref,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityProvider {
    pub name: String,
    pub auto_scaling_group_provider: AutoScalingGroupProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutoScalingGroupProvider {
    pub auto_scaling_group_arn: Ref,
    pub managed_scaling: Toggle,
    pub managed_termination_protection: Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Toggle {
    Disabled,
}

/// クラスターへのキャパシティプロバイダー登録
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityProviderAssociations {
    pub cluster: Ref,
    pub capacity_providers: Vec<Ref>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compatibility {
    Ec2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDefinition {
    pub requires_compatibilities: Vec<Compatibility>,
    pub network_mode: String,
    pub cpu: String,
    pub memory: String,
    pub execution_role_arn: GetAtt,
    pub container_definitions: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: EcrImage,
    pub memory: u32,
    pub essential: bool,
    pub port_mappings: Vec<PortMapping>,
}

/// ECR リポジトリ上のイメージ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EcrImage {
    pub repository: Ref,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    pub container_port: u16,
    /// 0 は動的ポート割り当て
    pub host_port: u16,
    pub protocol: Protocol,
    pub name: String,
    pub app_protocol: AppProtocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppProtocol {
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ec2Service {
    pub service_name: String,
    pub cluster: Ref,
    pub task_definition: Ref,
    pub desired_count: u32,
    pub launch_type: String,
}
