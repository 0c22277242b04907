//! スタック、ステージ、アプリ
//!
//! スタックはプロビジョニング単位となるリソース宣言の集まり。
//! 宣言順を保持し、参照の解決可能性を検証します。

use crate::error::{Result, SynthError};
use crate::model::{Ref, Resource, ResourceKind};
use crate::naming::logical_id;
use crate::tags::TagSet;
use bluegreen_config::EnvironmentConfig;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// 名前で参照するだけの既存リソース（このスタックでは作成しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Import {
    #[serde(skip)]
    pub logical_id: String,
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Stack {
    pub id: String,
    pub env: EnvironmentConfig,
    pub tags: TagSet,
    pub description: Option<String>,
    resources: Vec<Resource>,
    imports: Vec<Import>,
}

impl Stack {
    pub fn new(id: impl Into<String>, env: &EnvironmentConfig, tags: TagSet) -> Self {
        Self {
            id: id.into(),
            env: env.clone(),
            tags,
            description: None,
            resources: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// リソースを追加して参照を返す
    pub fn add(&mut self, resource: Resource) -> Result<Ref> {
        self.ensure_unique(&resource.logical_id)?;
        debug!(
            stack = %self.id,
            logical_id = %resource.logical_id,
            resource_type = resource.type_name(),
            "Declared resource"
        );
        let r = Ref::new(resource.logical_id.clone());
        self.resources.push(resource);
        Ok(r)
    }

    /// コンストラクトIDと種別から宣言
    pub fn declare(
        &mut self,
        construct_id: impl Into<String>,
        kind: impl Into<ResourceKind>,
    ) -> Result<Ref> {
        self.add(Resource::new(construct_id, kind)?)
    }

    /// 既存リソースを名前で参照
    pub fn import(
        &mut self,
        construct_id: &str,
        resource_type: &str,
        name: impl Into<String>,
    ) -> Result<Ref> {
        let id = logical_id(construct_id)?;
        self.ensure_unique(&id)?;
        self.imports.push(Import {
            logical_id: id.clone(),
            resource_type: resource_type.to_string(),
            name: name.into(),
        });
        Ok(Ref::new(id))
    }

    fn ensure_unique(&self, id: &str) -> Result<()> {
        let taken = self.resources.iter().any(|r| r.logical_id == id)
            || self.imports.iter().any(|i| i.logical_id == id);
        if taken {
            return Err(SynthError::DuplicateLogicalId {
                stack: self.id.clone(),
                logical_id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    /// コンストラクトIDで検索
    pub fn find(&self, construct_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.construct_id == construct_id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// すべての参照が宣言済みリソースかインポートを指していることを検証
    pub fn validate(&self) -> Result<()> {
        let known: HashSet<&str> = self
            .resources
            .iter()
            .map(|r| r.logical_id.as_str())
            .chain(self.imports.iter().map(|i| i.logical_id.as_str()))
            .collect();

        for resource in &self.resources {
            for reference in resource.references()? {
                if !known.contains(reference.as_str()) {
                    return Err(SynthError::UnresolvedReference {
                        stack: self.id.clone(),
                        source_id: resource.logical_id.clone(),
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    /// テンプレート表現（宣言順を保持）
    pub fn template(&self) -> Result<serde_json::Value> {
        let mut resources = serde_json::Map::new();
        for resource in &self.resources {
            resources.insert(resource.logical_id.clone(), resource.to_template()?);
        }

        let mut template = serde_json::Map::new();
        if let Some(description) = &self.description {
            template.insert("Description".to_string(), description.clone().into());
        }
        template.insert("Resources".to_string(), resources.into());

        if !self.imports.is_empty() {
            let mut imports = serde_json::Map::new();
            for import in &self.imports {
                imports.insert(import.logical_id.clone(), serde_json::to_value(import)?);
            }
            template.insert("Imports".to_string(), imports.into());
        }

        Ok(template.into())
    }
}

/// 同一環境にまとめてデプロイされるスタック群
#[derive(Debug, Clone)]
pub struct Stage {
    pub id: String,
    pub env: EnvironmentConfig,
    stacks: Vec<Stack>,
}

impl Stage {
    pub fn new(id: impl Into<String>, env: &EnvironmentConfig) -> Self {
        Self {
            id: id.into(),
            env: env.clone(),
            stacks: Vec::new(),
        }
    }

    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.iter().any(|s| s.id == stack.id) {
            return Err(SynthError::DuplicateStack(format!("{}/{}", self.id, stack.id)));
        }
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }
}

/// 合成のルート
#[derive(Debug, Clone, Default)]
pub struct App {
    stacks: Vec<Stack>,
    stages: Vec<Stage>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.iter().any(|s| s.id == stack.id) {
            return Err(SynthError::DuplicateStack(stack.id));
        }
        self.stacks.push(stack);
        Ok(())
    }

    pub fn add_stage(&mut self, stage: Stage) -> Result<()> {
        if self.stages.iter().any(|s| s.id == stage.id) {
            return Err(SynthError::DuplicateStack(stage.id));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// すべてのスタックを (ステージID, スタック) の組で列挙
    pub fn all_stacks(&self) -> impl Iterator<Item = (Option<&str>, &Stack)> {
        self.stacks.iter().map(|s| (None, s)).chain(
            self.stages
                .iter()
                .flat_map(|stage| stage.stacks.iter().map(move |s| (Some(stage.id.as_str()), s))),
        )
    }

    /// 全スタックを検証
    pub fn validate(&self) -> Result<()> {
        for (_, stack) in self.all_stacks() {
            stack.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EcrRepository, Ec2Service};

    fn env() -> EnvironmentConfig {
        EnvironmentConfig {
            account: "123456789012".to_string(),
            region: "ap-northeast-1".to_string(),
            stage: "test".to_string(),
            pattern: "dev".to_string(),
            owner: "ops".to_string(),
        }
    }

    fn stack() -> Stack {
        let e = env();
        Stack::new("TestStack", &e, TagSet::new("test", &e))
    }

    fn repo(name: &str) -> EcrRepository {
        EcrRepository {
            repository_name: name.to_string(),
        }
    }

    fn service(cluster: Ref, task_definition: Ref) -> Ec2Service {
        Ec2Service {
            service_name: "svc".to_string(),
            cluster,
            task_definition,
            desired_count: 1,
            launch_type: "EC2".to_string(),
        }
    }

    #[test]
    fn test_add_returns_ref() {
        let mut s = stack();
        let r = s.declare("my-repo", repo("a")).unwrap();
        assert_eq!(r.logical_id, "MyRepo");
        assert_eq!(s.len(), 1);
        assert!(s.get("MyRepo").is_some());
        assert!(s.find("my-repo").is_some());
    }

    #[test]
    fn test_duplicate_logical_id() {
        let mut s = stack();
        s.declare("my-repo", repo("a")).unwrap();
        let result = s.declare("my_repo", repo("b"));
        assert!(matches!(result, Err(SynthError::DuplicateLogicalId { .. })));
    }

    #[test]
    fn test_import_conflicts_with_resource() {
        let mut s = stack();
        s.declare("my-repo", repo("a")).unwrap();
        let result = s.import("my-repo", "AWS::ECR::Repository", "a");
        assert!(matches!(result, Err(SynthError::DuplicateLogicalId { .. })));
    }

    #[test]
    fn test_validate_resolves_imports() {
        let mut s = stack();
        let cluster = s.import("cluster", "AWS::ECS::Cluster", "existing").unwrap();
        let task = s.declare("task", repo("stand-in")).unwrap();
        s.declare("svc", service(cluster, task)).unwrap();

        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_unresolved_reference() {
        let mut s = stack();
        let task = s.declare("task", repo("stand-in")).unwrap();
        s.declare("svc", service(Ref::new("Missing"), task)).unwrap();

        match s.validate() {
            Err(SynthError::UnresolvedReference {
                source_id,
                reference,
                ..
            }) => {
                assert_eq!(source_id, "Svc");
                assert_eq!(reference, "Missing");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_template_preserves_declaration_order() {
        let mut s = stack().with_description("order test");
        for name in ["zeta", "alpha", "mid"] {
            s.declare(name, repo(name)).unwrap();
        }
        s.import("ext", "AWS::ECR::Repository", "external/repo").unwrap();

        let template = s.template().unwrap();
        let ids: Vec<&String> = template["Resources"].as_object().unwrap().keys().collect();
        assert_eq!(ids, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(template["Description"], "order test");
        assert_eq!(template["Imports"]["Ext"]["Name"], "external/repo");
        assert_eq!(template["Imports"]["Ext"]["Type"], "AWS::ECR::Repository");
    }

    #[test]
    fn test_app_all_stacks() {
        let e = env();
        let mut app = App::new();
        app.add_stack(stack()).unwrap();

        let mut stage = Stage::new("master-dev", &e);
        stage
            .add_stack(Stack::new("A", &e, TagSet::new("a", &e)))
            .unwrap();
        stage
            .add_stack(Stack::new("B", &e, TagSet::new("b", &e)))
            .unwrap();
        app.add_stage(stage).unwrap();

        let listed: Vec<(Option<&str>, &str)> =
            app.all_stacks().map(|(stage, s)| (stage, s.id.as_str())).collect();
        assert_eq!(
            listed,
            vec![
                (None, "TestStack"),
                (Some("master-dev"), "A"),
                (Some("master-dev"), "B"),
            ]
        );
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_duplicate_stack_in_stage() {
        let e = env();
        let mut stage = Stage::new("s", &e);
        stage.add_stack(Stack::new("A", &e, TagSet::new("a", &e))).unwrap();
        let result = stage.add_stack(Stack::new("A", &e, TagSet::new("a", &e)));
        assert!(matches!(result, Err(SynthError::DuplicateStack(_))));
    }
}
