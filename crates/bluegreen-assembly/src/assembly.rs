//! Cloud assembly
//!
//! The synthesized output handed to the provisioning engine: a directory
//! holding `manifest.json` and one template file per stack.

use crate::error::{AssemblyError, Result};
use bluegreen_core::{App, Stack};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument};

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

/// Template serialization format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "template.json",
            Self::Yaml => "template.yaml",
        }
    }

    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl FromStr for TemplateFormat {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(AssemblyError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Top-level description of a synthesized assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,

    /// When the assembly was synthesized
    pub generated_at: DateTime<Utc>,

    /// One entry per stack, in deployment order
    pub artifacts: Vec<Artifact>,
}

/// A deployable stack within the assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique artifact id (`{stage}-{stack}` for staged stacks)
    pub id: String,

    /// Stack id as declared
    pub stack_id: String,

    /// Owning stage, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Deployment target (`aws://{account}/{region}`)
    pub environment: String,

    /// Template file name, relative to the assembly directory
    pub template_file: String,

    /// Tags applied to every resource in the stack
    pub tags: BTreeMap<String, String>,

    /// Number of declared resources
    pub resource_count: usize,
}

impl Artifact {
    pub fn artifact_id(stage: Option<&str>, stack_id: &str) -> String {
        match stage {
            Some(stage) => format!("{}-{}", stage, stack_id),
            None => stack_id.to_string(),
        }
    }
}

/// Manifest plus the template of each artifact
#[derive(Debug, Clone)]
pub struct Assembly {
    pub manifest: Manifest,
    templates: BTreeMap<String, serde_json::Value>,
}

impl Assembly {
    /// Build the assembly for an app, validating every stack first
    #[instrument(skip(app))]
    pub fn from_app(app: &App, format: TemplateFormat) -> Result<Self> {
        app.validate()?;

        let mut artifacts = Vec::new();
        let mut templates = BTreeMap::new();

        for (stage, stack) in app.all_stacks() {
            let id = Artifact::artifact_id(stage, &stack.id);
            if templates.contains_key(&id) {
                return Err(AssemblyError::InvalidManifest(format!(
                    "duplicate artifact id: {}",
                    id
                )));
            }
            debug!(artifact = %id, resources = stack.len(), "Synthesizing stack");
            templates.insert(id.clone(), stack.template()?);
            artifacts.push(artifact_for(id, stage, stack, format));
        }

        Ok(Self {
            manifest: Manifest {
                version: MANIFEST_VERSION,
                generated_at: Utc::now(),
                artifacts,
            },
            templates,
        })
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.manifest.artifacts
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.manifest.artifacts.iter().find(|a| a.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&serde_json::Value> {
        self.templates.get(id)
    }

    /// Resources of one artifact as `(logical_id, declaration)` in template order
    pub fn resources(&self, id: &str) -> Vec<(&String, &serde_json::Value)> {
        self.templates
            .get(id)
            .and_then(|t| t.get("Resources"))
            .and_then(|r| r.as_object())
            .map(|r| r.iter().collect())
            .unwrap_or_default()
    }

    /// Write the assembly to `dir`
    ///
    /// Templates are written before the manifest so that a directory with a
    /// manifest is always complete.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        for artifact in &self.manifest.artifacts {
            let path = dir.join(&artifact.template_file);
            let template = self.templates.get(&artifact.id).ok_or_else(|| {
                AssemblyError::InvalidManifest(format!("no template for {}", artifact.id))
            })?;
            let content = match TemplateFormat::from_path(&path) {
                TemplateFormat::Json => serde_json::to_string_pretty(template)?,
                TemplateFormat::Yaml => serde_yaml::to_string(template)?,
            };
            std::fs::write(&path, content).map_err(|e| io_error(&path, e))?;
            debug!(path = %path.display(), "Wrote template");
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(&manifest_path, manifest).map_err(|e| io_error(&manifest_path, e))?;

        info!(
            artifacts = self.manifest.artifacts.len(),
            manifest = %manifest_path.display(),
            "Assembly written"
        );
        Ok(manifest_path)
    }

    /// Read an assembly previously written with [`Assembly::write`]
    #[instrument(fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content =
            std::fs::read_to_string(&manifest_path).map_err(|e| io_error(&manifest_path, e))?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        if manifest.version != MANIFEST_VERSION {
            return Err(AssemblyError::UnsupportedVersion(manifest.version));
        }

        let mut templates = BTreeMap::new();
        for artifact in &manifest.artifacts {
            let path = dir.join(&artifact.template_file);
            let content = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            let template: serde_json::Value = match TemplateFormat::from_path(&path) {
                TemplateFormat::Json => serde_json::from_str(&content)?,
                TemplateFormat::Yaml => serde_yaml::from_str(&content)?,
            };
            if template.get("Resources").is_none() {
                return Err(AssemblyError::InvalidManifest(format!(
                    "{} has no Resources section",
                    artifact.template_file
                )));
            }
            templates.insert(artifact.id.clone(), template);
        }

        debug!(artifacts = manifest.artifacts.len(), "Assembly loaded");
        Ok(Self {
            manifest,
            templates,
        })
    }
}

fn artifact_for(id: String, stage: Option<&str>, stack: &Stack, format: TemplateFormat) -> Artifact {
    Artifact {
        template_file: format!("{}.{}", id, format.extension()),
        id,
        stack_id: stack.id.clone(),
        stage: stage.map(str::to_string),
        environment: stack.env.target(),
        tags: stack.tags.to_map(),
        resource_count: stack.len(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> AssemblyError {
    AssemblyError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluegreen_core::{EnvironmentConfig, PipelineOptions, synthesize};

    fn env() -> EnvironmentConfig {
        EnvironmentConfig {
            account: "123456789012".to_string(),
            region: "ap-northeast-1".to_string(),
            stage: "test".to_string(),
            pattern: "dev".to_string(),
            owner: "ops".to_string(),
        }
    }

    fn assembly(format: TemplateFormat) -> Assembly {
        let app = synthesize(&env(), &PipelineOptions::default()).unwrap();
        Assembly::from_app(&app, format).unwrap()
    }

    #[test]
    fn test_artifacts() {
        let assembly = assembly(TemplateFormat::Json);
        let ids: Vec<&str> = assembly.artifacts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ecs-blue-green-deployments-pipeline",
                "master-dev-simflexcloud-ecs-blue-green-deployments-build-image",
                "master-dev-EcsBlueGreenDeploymentsStack",
            ]
        );

        let ecs = assembly.artifact("master-dev-EcsBlueGreenDeploymentsStack").unwrap();
        assert_eq!(ecs.stage.as_deref(), Some("master-dev"));
        assert_eq!(ecs.environment, "aws://123456789012/ap-northeast-1");
        assert_eq!(ecs.tags["stack-name"], "dev-simflexcloud-test-build-image");
        assert_eq!(ecs.tags.len(), 5);
        assert_eq!(
            ecs.template_file,
            "master-dev-EcsBlueGreenDeploymentsStack.template.json"
        );
        assert_eq!(assembly.resources(&ecs.id).len(), ecs.resource_count);
    }

    #[test]
    fn test_write_and_load_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("cdk.out");
        let original = assembly(TemplateFormat::Json);

        let manifest_path = original.write(&out).unwrap();
        assert!(manifest_path.ends_with("manifest.json"));
        for artifact in original.artifacts() {
            assert!(out.join(&artifact.template_file).is_file());
        }

        let loaded = Assembly::load(&out).unwrap();
        assert_eq!(loaded.artifacts(), original.artifacts());
        for artifact in original.artifacts() {
            assert_eq!(loaded.template(&artifact.id), original.template(&artifact.id));
        }
    }

    #[test]
    fn test_write_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = assembly(TemplateFormat::Yaml);
        original.write(temp_dir.path()).unwrap();

        let artifact = &original.artifacts()[0];
        assert!(artifact.template_file.ends_with(".template.yaml"));
        let content =
            std::fs::read_to_string(temp_dir.path().join(&artifact.template_file)).unwrap();
        assert!(content.contains("Custom::DeploymentPipeline"));

        let loaded = Assembly::load(temp_dir.path()).unwrap();
        assert_eq!(
            loaded.resources(&artifact.id).len(),
            original.resources(&artifact.id).len()
        );
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = Assembly::load(temp_dir.path());
        assert!(matches!(result, Err(AssemblyError::Io { .. })));
    }

    #[test]
    fn test_load_unsupported_version() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join(MANIFEST_FILE),
            r#"{"version": 99, "generated_at": "2024-01-01T00:00:00Z", "artifacts": []}"#,
        )
        .unwrap();

        let result = Assembly::load(temp_dir.path());
        assert!(matches!(result, Err(AssemblyError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<TemplateFormat>().unwrap(), TemplateFormat::Json);
        assert_eq!("yml".parse::<TemplateFormat>().unwrap(), TemplateFormat::Yaml);
        assert!("toml".parse::<TemplateFormat>().is_err());
    }

    #[test]
    fn test_listener_target_list_in_template() {
        let assembly = assembly(TemplateFormat::Json);
        let template = assembly
            .template("master-dev-EcsBlueGreenDeploymentsStack")
            .unwrap();
        let tg = &template["Resources"]["DevSimflexcloudTestEcsBlueGreenDeploymentsTarget80"];

        assert_eq!(tg["Type"], "AWS::ElasticLoadBalancingV2::TargetGroup");
        assert_eq!(tg["Properties"]["HealthCheckPath"], "/api/");
        assert_eq!(
            tg["Properties"]["Targets"],
            serde_json::json!([
                { "Ref": "DevSimflexcloudTestEcsBlueGreenDeploymentsEc2GreenService" },
                { "Ref": "DevSimflexcloudTestEcsBlueGreenDeploymentsEc2BlueService" }
            ])
        );
    }
}
