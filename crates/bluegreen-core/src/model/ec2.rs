//! ネットワークとインスタンス

use super::{GetAtt, Ref};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub vpc_name: String,
    pub cidr_block: String,
    pub max_azs: u32,
    pub nat_gateways: u32,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
}

impl Vpc {
    pub fn new(vpc_name: impl Into<String>, max_azs: u32, nat_gateways: u32) -> Self {
        Self {
            vpc_name: vpc_name.into(),
            cidr_block: "10.0.0.0/16".to_string(),
            max_azs,
            nat_gateways,
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_name: String,
    pub group_description: String,
    pub vpc_id: Ref,
    pub allow_all_outbound: bool,
}

/// セキュリティグループ間のインバウンドルール
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupIngress {
    pub group_id: GetAtt,
    pub source_security_group_id: GetAtt,
    /// `-1` は全プロトコル
    pub ip_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    pub description: String,
}

impl SecurityGroupIngress {
    /// 送信元グループからの全トラフィックを許可
    pub fn all_traffic_from(group: &Ref, source: &Ref, description: impl Into<String>) -> Self {
        Self {
            group_id: group.attr("GroupId"),
            source_security_group_id: source.attr("GroupId"),
            ip_protocol: "-1".to_string(),
            from_port: None,
            to_port: None,
            description: description.into(),
        }
    }
}

/// マシンイメージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineImage {
    /// ECS 最適化 Amazon Linux 2
    EcsOptimizedAmazonLinux2,
}

impl MachineImage {
    /// AMI ID を解決する SSM パラメータ
    pub fn ssm_parameter(&self) -> &'static str {
        match self {
            Self::EcsOptimizedAmazonLinux2 => {
                "/aws/service/ecs/optimized-ami/amazon-linux-2/recommended/image_id"
            }
        }
    }
}

impl Serialize for MachineImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("resolve:ssm:{}", self.ssm_parameter()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutoScalingGroup {
    pub auto_scaling_group_name: String,
    pub min_size: u32,
    pub max_size: u32,
    pub instance_type: String,
    pub image_id: MachineImage,
    pub security_groups: Vec<GetAtt>,
    pub instance_role: Ref,
    pub vpc: Ref,
}
