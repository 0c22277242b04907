//! リソースモデル
//!
//! スタックに宣言するリソースの型定義。各リソースは CloudFormation の型名と
//! プロパティ構造体の組として表現され、相互参照は [`Ref`] / [`GetAtt`] で行います。

mod ci;
mod ec2;
mod ecs;
mod elb;
mod iam;
mod pipeline;

pub use ci::*;
pub use ec2::*;
pub use ecs::*;
pub use elb::*;
pub use iam::*;
pub use pipeline::*;

use crate::error::Result;
use crate::naming::logical_id;
use serde::{Deserialize, Serialize};

/// 同一スタック内のリソースへの参照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "Ref")]
    pub logical_id: String,
}

impl Ref {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    /// このリソースの属性を参照
    pub fn attr(&self, attribute: &str) -> GetAtt {
        GetAtt {
            target: (self.logical_id.clone(), attribute.to_string()),
        }
    }
}

/// リソース属性への参照（Arn, GroupId など）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAtt {
    #[serde(rename = "Fn::GetAtt")]
    pub target: (String, String),
}

/// スタック削除時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPolicy {
    Delete,
}

/// スタックに宣言されるリソース
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// 宣言時のID（人間向け）
    pub construct_id: String,
    /// テンプレート上の論理ID
    pub logical_id: String,
    pub kind: ResourceKind,
    pub deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    pub fn new(construct_id: impl Into<String>, kind: impl Into<ResourceKind>) -> Result<Self> {
        let construct_id = construct_id.into();
        Ok(Self {
            logical_id: logical_id(&construct_id)?,
            construct_id,
            kind: kind.into(),
            deletion_policy: None,
        })
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// テンプレート上の表現
    ///
    /// `{"Type": ..., "Properties": {...}, "DeletionPolicy": ..., "Metadata": {...}}`
    pub fn to_template(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(&self.kind)?;
        if let Some(entry) = value.as_object_mut() {
            if let Some(policy) = self.deletion_policy {
                entry.insert("DeletionPolicy".to_string(), serde_json::to_value(policy)?);
            }
            entry.insert(
                "Metadata".to_string(),
                serde_json::json!({ "bluegreen:construct-id": self.construct_id }),
            );
        }
        Ok(value)
    }

    /// プロパティ内のすべての参照先論理ID
    pub fn references(&self) -> Result<Vec<String>> {
        let value = serde_json::to_value(&self.kind)?;
        let mut refs = Vec::new();
        collect_references(&value, &mut refs);
        Ok(refs)
    }
}

fn collect_references(value: &serde_json::Value, refs: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(id)) = map.get("Ref") {
                refs.push(id.clone());
            }
            if let Some(serde_json::Value::Array(target)) = map.get("Fn::GetAtt") {
                if let Some(serde_json::Value::String(id)) = target.first() {
                    refs.push(id.clone());
                }
            }
            for v in map.values() {
                collect_references(v, refs);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                collect_references(v, refs);
            }
        }
        _ => {}
    }
}

/// リソース種別
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type", content = "Properties")]
pub enum ResourceKind {
    #[serde(rename = "AWS::IAM::Role")]
    Role(Role),
    #[serde(rename = "AWS::IAM::Policy")]
    Policy(Policy),
    #[serde(rename = "AWS::EC2::VPC")]
    Vpc(Vpc),
    #[serde(rename = "AWS::EC2::SecurityGroup")]
    SecurityGroup(SecurityGroup),
    #[serde(rename = "AWS::EC2::SecurityGroupIngress")]
    SecurityGroupIngress(SecurityGroupIngress),
    #[serde(rename = "AWS::AutoScaling::AutoScalingGroup")]
    AutoScalingGroup(AutoScalingGroup),
    #[serde(rename = "AWS::ECS::Cluster")]
    Cluster(Cluster),
    #[serde(rename = "AWS::ECS::CapacityProvider")]
    CapacityProvider(CapacityProvider),
    #[serde(rename = "AWS::ECS::ClusterCapacityProviderAssociations")]
    CapacityProviderAssociations(CapacityProviderAssociations),
    #[serde(rename = "AWS::ECS::TaskDefinition")]
    TaskDefinition(TaskDefinition),
    #[serde(rename = "AWS::ECS::Service")]
    Ec2Service(Ec2Service),
    #[serde(rename = "AWS::ElasticLoadBalancingV2::LoadBalancer")]
    LoadBalancer(LoadBalancer),
    #[serde(rename = "AWS::ElasticLoadBalancingV2::Listener")]
    Listener(Listener),
    #[serde(rename = "AWS::ElasticLoadBalancingV2::TargetGroup")]
    TargetGroup(TargetGroup),
    #[serde(rename = "AWS::ECR::Repository")]
    EcrRepository(EcrRepository),
    #[serde(rename = "AWS::CodeCommit::Repository")]
    CodeCommitRepository(CodeCommitRepository),
    #[serde(rename = "AWS::CodeBuild::Project")]
    BuildProject(BuildProject),
    #[serde(rename = "AWS::CodePipeline::Pipeline")]
    Pipeline(Pipeline),
    #[serde(rename = "Custom::DeploymentPipeline")]
    DeploymentPipeline(DeploymentPipeline),
}

impl ResourceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Role(_) => "AWS::IAM::Role",
            Self::Policy(_) => "AWS::IAM::Policy",
            Self::Vpc(_) => "AWS::EC2::VPC",
            Self::SecurityGroup(_) => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress(_) => "AWS::EC2::SecurityGroupIngress",
            Self::AutoScalingGroup(_) => "AWS::AutoScaling::AutoScalingGroup",
            Self::Cluster(_) => "AWS::ECS::Cluster",
            Self::CapacityProvider(_) => "AWS::ECS::CapacityProvider",
            Self::CapacityProviderAssociations(_) => {
                "AWS::ECS::ClusterCapacityProviderAssociations"
            }
            Self::TaskDefinition(_) => "AWS::ECS::TaskDefinition",
            Self::Ec2Service(_) => "AWS::ECS::Service",
            Self::LoadBalancer(_) => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::Listener(_) => "AWS::ElasticLoadBalancingV2::Listener",
            Self::TargetGroup(_) => "AWS::ElasticLoadBalancingV2::TargetGroup",
            Self::EcrRepository(_) => "AWS::ECR::Repository",
            Self::CodeCommitRepository(_) => "AWS::CodeCommit::Repository",
            Self::BuildProject(_) => "AWS::CodeBuild::Project",
            Self::Pipeline(_) => "AWS::CodePipeline::Pipeline",
            Self::DeploymentPipeline(_) => "Custom::DeploymentPipeline",
        }
    }
}

macro_rules! impl_into_kind {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ResourceKind {
                fn from(value: $ty) -> Self {
                    ResourceKind::$variant(value)
                }
            }
        )*
    };
}

impl_into_kind! {
    Role => Role,
    Policy => Policy,
    Vpc => Vpc,
    SecurityGroup => SecurityGroup,
    SecurityGroupIngress => SecurityGroupIngress,
    AutoScalingGroup => AutoScalingGroup,
    Cluster => Cluster,
    CapacityProvider => CapacityProvider,
    CapacityProviderAssociations => CapacityProviderAssociations,
    TaskDefinition => TaskDefinition,
    Ec2Service => Ec2Service,
    LoadBalancer => LoadBalancer,
    Listener => Listener,
    TargetGroup => TargetGroup,
    EcrRepository => EcrRepository,
    CodeCommitRepository => CodeCommitRepository,
    BuildProject => BuildProject,
    Pipeline => Pipeline,
    DeploymentPipeline => DeploymentPipeline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_serialization() {
        let r = Ref::new("MyVpc");
        assert_eq!(serde_json::to_value(&r).unwrap(), serde_json::json!({ "Ref": "MyVpc" }));

        let a = r.attr("VpcId");
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::json!({ "Fn::GetAtt": ["MyVpc", "VpcId"] })
        );
    }

    #[test]
    fn test_resource_template_shape() {
        let resource = Resource::new(
            "my-repo",
            EcrRepository {
                repository_name: "simflexcloud/app".to_string(),
            },
        )
        .unwrap()
        .with_deletion_policy(DeletionPolicy::Delete);

        assert_eq!(resource.logical_id, "MyRepo");
        assert_eq!(resource.type_name(), "AWS::ECR::Repository");

        let template = resource.to_template().unwrap();
        assert_eq!(template["Type"], "AWS::ECR::Repository");
        assert_eq!(template["Properties"]["RepositoryName"], "simflexcloud/app");
        assert_eq!(template["DeletionPolicy"], "Delete");
        assert_eq!(template["Metadata"]["bluegreen:construct-id"], "my-repo");
    }

    #[test]
    fn test_references_collects_ref_and_getatt() {
        let vpc = Ref::new("Vpc");
        let sg = Ref::new("Sg");
        let resource = Resource::new(
            "alb",
            LoadBalancer {
                name: "alb".to_string(),
                scheme: LoadBalancerScheme::InternetFacing,
                load_balancer_type: "application".to_string(),
                security_groups: vec![sg.attr("GroupId")],
                vpc,
            },
        )
        .unwrap();

        let mut refs = resource.references().unwrap();
        refs.sort();
        assert_eq!(refs, vec!["Sg".to_string(), "Vpc".to_string()]);
    }
}
