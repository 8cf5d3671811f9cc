//! Workflow aggregation.
//!
//! Each resource of a grain is asked for its workflow instantiations. Within
//! a grain, instantiations are grouped by blueprint name into one
//! [`WorkflowSummary`] per workflow, recording which resources reported it.
//! Grouping never crosses grain boundaries.

use std::collections::BTreeSet;

use envctx_client::EnvironmentService;
use envctx_model::{SimplifiedEnvironmentDocument, WorkflowInstantiation, WorkflowSummary};
use futures::{StreamExt, stream};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::outcome::ItemFailure;

/// The document with workflows attached, plus any absorbed failures.
#[derive(Debug)]
pub struct AttachedWorkflows {
  pub document: SimplifiedEnvironmentDocument,
  pub failures: Vec<ItemFailure>,
}

/// Group the instantiations reported by a grain's resources.
///
/// Summaries are returned in first-seen order of their blueprint name. The
/// first instantiation seen for a name fixes its inputs. The set of
/// resources per name does not depend on the order of `observations`.
/// Instantiations without a blueprint name are skipped.
pub fn group_workflows<I>(observations: I) -> Vec<WorkflowSummary>
where
  I: IntoIterator<Item = (String, Vec<WorkflowInstantiation>)>,
{
  let mut grouped: IndexMap<String, WorkflowSummary> = IndexMap::new();

  for (resource, instantiations) in observations {
    for instantiation in instantiations {
      let WorkflowInstantiation {
        blueprint_name,
        inputs,
      } = instantiation;
      if blueprint_name.trim().is_empty() {
        continue;
      }
      grouped
        .entry(blueprint_name.clone())
        .or_insert_with(|| WorkflowSummary {
          name: blueprint_name,
          inputs,
          resources: BTreeSet::new(),
        })
        .resources
        .insert(resource.clone());
    }
  }

  grouped.into_values().collect()
}

/// Fetch workflows for every resource of every grain and attach the grouped
/// summaries to the document.
///
/// Grains without resources are skipped without any request. A failed
/// resource is logged, recorded and left out of grouping. Requests across
/// all grains share one `max_concurrency` budget; responses are folded in
/// request order, so the result matches a sequential run.
#[instrument(skip(service, document), fields(grain_count = document.grains.len()))]
pub async fn attach_workflows<S>(
  service: &S,
  space: &str,
  environment_id: &str,
  mut document: SimplifiedEnvironmentDocument,
  max_concurrency: usize,
) -> AttachedWorkflows
where
  S: EnvironmentService + ?Sized,
{
  let requests: Vec<(&str, &str, &str)> = document
    .grains
    .iter()
    .flat_map(|(grain, details)| {
      details
        .resources
        .iter()
        .map(move |r| (grain.as_str(), details.path.as_str(), r.name.as_str()))
    })
    .collect();

  let responses: Vec<_> = stream::iter(requests)
    .map(|(grain, grain_path, resource)| async move {
      let result = service
        .get_workflows(space, environment_id, grain_path, resource)
        .await;
      (grain.to_string(), resource.to_string(), result)
    })
    .buffered(max_concurrency.max(1))
    .collect()
    .await;

  let mut failures = Vec::new();
  let mut observations: IndexMap<String, Vec<(String, Vec<WorkflowInstantiation>)>> =
    IndexMap::new();

  for (grain, resource, result) in responses {
    match result {
      Ok(instantiations) => {
        debug!(grain = %grain, resource = %resource, workflows = instantiations.len(), "resource workflows fetched");
        observations
          .entry(grain)
          .or_default()
          .push((resource, instantiations));
      }
      Err(e) => {
        warn!(grain = %grain, resource = %resource, error = %e, "workflow lookup failed, skipping resource");
        failures.push(ItemFailure::resource(&grain, &resource, &e));
      }
    }
  }

  for (grain, grain_observations) in observations {
    if let Some(details) = document.grains.get_mut(&grain) {
      details.workflows = group_workflows(grain_observations);
    }
  }

  AttachedWorkflows { document, failures }
}
