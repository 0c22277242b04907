//! Application Load Balancer

use super::{GetAtt, Ref};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerScheme {
    InternetFacing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancer {
    pub name: String,
    pub scheme: LoadBalancerScheme,
    #[serde(rename = "Type")]
    pub load_balancer_type: String,
    pub security_groups: Vec<GetAtt>,
    pub vpc: Ref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationProtocol {
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
    pub load_balancer_arn: Ref,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    /// 0.0.0.0/0 からの受信を許可するか
    pub open: bool,
    pub default_actions: Vec<ListenerAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerAction {
    #[serde(rename = "Type")]
    pub action_type: String,
    pub target_group_arn: Ref,
}

impl ListenerAction {
    pub fn forward(target_group: Ref) -> Self {
        Self {
            action_type: "forward".to_string(),
            target_group_arn: target_group,
        }
    }
}

/// ターゲットグループ
///
/// `targets` に登録されたサービスはすべて同時にトラフィックを受ける。
/// 配分は各サービスの desired count で決まる。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetGroup {
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub vpc_id: Ref,
    pub target_type: String,
    pub health_check_path: String,
    pub targets: Vec<Ref>,
}
