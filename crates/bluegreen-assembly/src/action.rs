//! Change planning between two assemblies

use crate::assembly::Assembly;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

/// A planned change to one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// `{artifact}/{logical_id}`
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type (e.g., "AWS::ECS::Service")
    pub resource_type: String,

    /// Artifact the resource belongs to
    pub artifact: String,

    /// Logical id within the artifact template
    pub logical_id: String,

    /// Description of the action
    pub description: String,

    /// Property names that changed (updates only)
    pub details: HashMap<String, serde_json::Value>,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl ActionType {
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionType::Create => "+",
            ActionType::Update => "~",
            ActionType::Delete => "-",
            ActionType::NoOp => " ",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all changes from one assembly to the next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Compare resources artifact by artifact
    ///
    /// Artifacts are ordered as in `next`, followed by artifacts that only
    /// exist in `previous`. Within an artifact, resources follow template order
    /// and deletions come last.
    #[instrument(skip_all)]
    pub fn between(previous: &Assembly, next: &Assembly) -> Self {
        let mut artifact_ids: Vec<&str> = next.artifacts().iter().map(|a| a.id.as_str()).collect();
        for artifact in previous.artifacts() {
            if next.artifact(&artifact.id).is_none() {
                artifact_ids.push(&artifact.id);
            }
        }

        let mut actions = Vec::new();
        for artifact in artifact_ids {
            let before = previous.resources(artifact);
            let after = next.resources(artifact);
            let before_ids: BTreeSet<&str> = before.iter().map(|(id, _)| id.as_str()).collect();
            let after_ids: BTreeSet<&str> = after.iter().map(|(id, _)| id.as_str()).collect();

            for (logical_id, resource) in &after {
                let old = before.iter().find(|(id, _)| id == logical_id).map(|(_, r)| *r);
                actions.push(match old {
                    None => action(artifact, logical_id, resource, ActionType::Create),
                    Some(old) if old == *resource => {
                        action(artifact, logical_id, resource, ActionType::NoOp)
                    }
                    Some(old) => {
                        let mut update = action(artifact, logical_id, resource, ActionType::Update);
                        let changed = changed_properties(old, resource);
                        update.description = format!(
                            "Update {} ({})",
                            logical_id,
                            if changed.is_empty() {
                                "metadata".to_string()
                            } else {
                                changed.join(", ")
                            }
                        );
                        update
                            .details
                            .insert("changed_properties".to_string(), changed.into());
                        update
                    }
                });
            }

            for (logical_id, resource) in &before {
                if !after_ids.contains(logical_id.as_str()) {
                    actions.push(action(artifact, logical_id, resource, ActionType::Delete));
                }
            }

            debug!(
                artifact,
                before = before_ids.len(),
                after = after_ids.len(),
                "Compared artifact"
            );
        }

        Self::new(actions)
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

fn action(
    artifact: &str,
    logical_id: &str,
    resource: &serde_json::Value,
    action_type: ActionType,
) -> Action {
    let resource_type = resource
        .get("Type")
        .and_then(|t| t.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let description = match action_type {
        ActionType::Create => format!("Create {} ({})", logical_id, resource_type),
        ActionType::Update => format!("Update {}", logical_id),
        ActionType::Delete => format!("Delete {} ({})", logical_id, resource_type),
        ActionType::NoOp => format!("{} is up to date", logical_id),
    };

    Action {
        id: format!("{}/{}", artifact, logical_id),
        action_type,
        resource_type,
        artifact: artifact.to_string(),
        logical_id: logical_id.to_string(),
        description,
        details: HashMap::new(),
    }
}

/// Top-level property names whose values differ
fn changed_properties(old: &serde_json::Value, new: &serde_json::Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let old_props = old
        .get("Properties")
        .and_then(|p| p.as_object())
        .unwrap_or(&empty);
    let new_props = new
        .get("Properties")
        .and_then(|p| p.as_object())
        .unwrap_or(&empty);

    let keys: BTreeSet<&String> = old_props.keys().chain(new_props.keys()).collect();
    keys.into_iter()
        .filter(|k| old_props.get(*k) != new_props.get(*k))
        .cloned()
        .collect()
}
