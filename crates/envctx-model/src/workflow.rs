use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::de;

/// A workflow bound to a single resource, as returned by the workflows
/// endpoint for that resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInstantiation {
  #[serde(default, alias = "blueprintName", deserialize_with = "de::text")]
  pub blueprint_name: String,

  #[serde(default, deserialize_with = "de::null_as_default")]
  pub inputs: Vec<WorkflowInput>,
}

/// A workflow input signature entry. Only name and type are kept; input
/// values bound on the instantiation are not part of the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
  #[serde(default, deserialize_with = "de::text")]
  pub name: String,

  #[serde(rename = "type", default, deserialize_with = "de::text")]
  pub input_type: String,
}

/// All instantiations of one workflow within a single grain.
///
/// `inputs` come from the first instantiation seen for this name.
/// `resources` holds every resource in the grain that reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
  pub name: String,
  pub inputs: Vec<WorkflowInput>,
  pub resources: BTreeSet<String>,
}
