//! The simplified environment document.
//!
//! Field order on these structs is the order keys appear in the rendered
//! artifact, so reordering fields changes the output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::resource::ResourceSummary;
use crate::workflow::WorkflowSummary;

/// Name of a grain, unique within an environment.
pub type GrainIdentifier = String;

/// Normalized description of one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedEnvironmentDocument {
  pub environment_id: String,
  pub space_name: String,
  pub status: String,
  pub inputs: Vec<InputValue>,
  /// Grains in the order the remote service listed them.
  pub grains: IndexMap<GrainIdentifier, GrainDetails>,
}

impl SimplifiedEnvironmentDocument {
  /// Total number of resources across all grains.
  pub fn resource_count(&self) -> usize {
    self.grains.values().map(|g| g.resources.len()).sum()
  }

  /// Total number of workflow summaries across all grains.
  pub fn workflow_count(&self) -> usize {
    self.grains.values().map(|g| g.workflows.len()).sum()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrainDetails {
  pub path: String,
  pub kind: String,
  pub execution_host: String,
  pub inputs: Vec<InputValue>,
  pub state: GrainState,
  pub resources: Vec<ResourceSummary>,
  pub workflows: Vec<WorkflowSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrainState {
  pub current_state: String,
  /// Activities of every deployment stage, flattened in stage order.
  pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
  pub name: String,
  pub status: String,
}

/// A `name`/`value` input pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValue {
  pub name: String,
  pub value: String,
}
