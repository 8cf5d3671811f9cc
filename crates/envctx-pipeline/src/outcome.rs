use envctx_model::SimplifiedEnvironmentDocument;
use serde::{Deserialize, Serialize};

/// A grain or resource whose data could not be fetched.
///
/// The run still succeeds; the affected grain ends up with no resources, or
/// the affected resource contributes no workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
  pub grain: String,
  /// Set when a single resource's workflow lookup failed.
  pub resource: Option<String>,
  pub error: String,
}

impl ItemFailure {
  pub(crate) fn grain(grain: &str, error: impl ToString) -> Self {
    Self {
      grain: grain.to_string(),
      resource: None,
      error: error.to_string(),
    }
  }

  pub(crate) fn resource(grain: &str, resource: &str, error: impl ToString) -> Self {
    Self {
      grain: grain.to_string(),
      resource: Some(resource.to_string()),
      error: error.to_string(),
    }
  }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
  pub run_id: String,
  pub document: SimplifiedEnvironmentDocument,
  /// The rendered document.
  pub artifact: String,
  /// Per-item failures absorbed during the run.
  pub failures: Vec<ItemFailure>,
  /// Where the sink stored the artifact, if it was handed to one.
  pub location: Option<String>,
}

impl PipelineOutcome {
  /// Whether any grain or resource data is missing because of a failure.
  pub fn is_partial(&self) -> bool {
    !self.failures.is_empty()
  }
}
