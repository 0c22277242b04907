//! Cloud assembly for ECS blue/green deployments
//!
//! Turns a synthesized [`bluegreen_core::App`] into files the provisioning
//! engine consumes, and compares two assemblies to preview a deployment.
//!
//! ```text
//! cdk.out/
//! ├── manifest.json
//! ├── ecs-blue-green-deployments-pipeline.template.json
//! ├── master-{pattern}-simflexcloud-ecs-blue-green-deployments-build-image.template.json
//! └── master-{pattern}-EcsBlueGreenDeploymentsStack.template.json
//! ```

pub mod action;
pub mod assembly;
pub mod error;

pub use action::{Action, ActionType, Plan, PlanSummary};
pub use assembly::{Artifact, Assembly, MANIFEST_FILE, MANIFEST_VERSION, Manifest, TemplateFormat};
pub use error::{AssemblyError, Result};
