//! IAM ロールとポリシー

use super::{GetAtt, Ref};
use serde::{Deserialize, Serialize};

const POLICY_VERSION: &str = "2012-10-17";

/// AWS 管理ポリシーの ARN
pub fn aws_managed_policy(name: &str) -> String {
    format!("arn:aws:iam::aws:policy/{}", name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub role_name: String,
    pub assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<String>,
}

impl Role {
    /// 指定サービスプリンシパルが引き受けるロール
    pub fn assumed_by(role_name: impl Into<String>, service: &str) -> Self {
        Self {
            role_name: role_name.into(),
            assume_role_policy_document: PolicyDocument::new(vec![PolicyStatement {
                effect: Effect::Allow,
                principal: Some(Principal {
                    service: service.to_string(),
                }),
                action: vec!["sts:AssumeRole".to_string()],
                resource: Vec::new(),
            }]),
            managed_policy_arns: Vec::new(),
        }
    }

    pub fn with_managed_policy(mut self, name: &str) -> Self {
        self.managed_policy_arns.push(aws_managed_policy(name));
        self
    }
}

/// ロールにアタッチするインラインポリシー
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub policy_name: String,
    pub policy_document: PolicyDocument,
    pub roles: Vec<Ref>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<PolicyResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

/// ステートメントの対象
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyResource {
    /// `*` などのリテラル
    Literal(String),
    /// 同一スタック内リソースの属性
    Attribute(GetAtt),
}
