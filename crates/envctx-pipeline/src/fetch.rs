//! Remote fetch stages: the environment itself and per-grain introspection.

use envctx_client::{ClientError, EnvironmentService};
use envctx_model::{GrainIdentifier, IntrospectedResource};
use futures::{StreamExt, stream};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::error::PipelineError;
use crate::outcome::ItemFailure;

/// Resources fetched for every requested grain.
#[derive(Debug, Default)]
pub struct GrainResources {
  /// One entry per requested grain, in request order. Failed grains map to
  /// an empty list.
  pub resources: IndexMap<GrainIdentifier, Vec<IntrospectedResource>>,
  pub failures: Vec<ItemFailure>,
}

pub(crate) fn require(name: &'static str, value: &str) -> Result<(), PipelineError> {
  if value.trim().is_empty() {
    return Err(PipelineError::MissingParameter { name });
  }
  Ok(())
}

/// Fetch the raw environment description.
///
/// This is the only fetch without failure tolerance: nothing downstream can
/// run without it.
#[instrument(skip(service))]
pub async fn fetch_environment<S>(
  service: &S,
  space: &str,
  environment_id: &str,
) -> Result<serde_json::Value, PipelineError>
where
  S: EnvironmentService + ?Sized,
{
  require("space", space)?;
  require("environment_id", environment_id)?;

  service
    .get_environment(space, environment_id)
    .await
    .map_err(|source| match source {
      ClientError::MissingParameter { name } => PipelineError::MissingParameter { name },
      source => PipelineError::EnvironmentFetch {
        space: space.to_string(),
        environment_id: environment_id.to_string(),
        source,
      },
    })
}

/// Fetch introspected resources for each grain.
///
/// At most `max_concurrency` requests are in flight. A failed grain is
/// logged, recorded, and given an empty resource list; it never stops the
/// remaining grains.
#[instrument(skip(service, grains), fields(grain_count = grains.len()))]
pub async fn fetch_grain_resources<S>(
  service: &S,
  space: &str,
  environment_id: &str,
  grains: &[GrainIdentifier],
  max_concurrency: usize,
) -> GrainResources
where
  S: EnvironmentService + ?Sized,
{
  let responses: Vec<_> = stream::iter(grains)
    .map(|grain| async move {
      let result = service
        .get_introspection(space, environment_id, grain)
        .await;
      (grain, result)
    })
    .buffered(max_concurrency.max(1))
    .collect()
    .await;

  let mut fetched = GrainResources::default();
  for (grain, result) in responses {
    match result {
      Ok(resources) => {
        debug!(grain = %grain, resources = resources.len(), "grain introspected");
        fetched.resources.insert(grain.clone(), resources);
      }
      Err(e) => {
        warn!(grain = %grain, error = %e, "grain introspection failed, continuing without its resources");
        fetched.failures.push(ItemFailure::grain(grain, &e));
        fetched.resources.insert(grain.clone(), Vec::new());
      }
    }
  }

  fetched
}
