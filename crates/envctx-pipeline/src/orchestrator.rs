//! Pipeline orchestration.
//!
//! The [`Pipeline`] runs the six stages in order, reports progress after each
//! one, and either produces a [`PipelineOutcome`] or fails with a
//! [`PipelineError`].

use std::any::Any;
use std::time::Duration;

use envctx_client::EnvironmentService;
use envctx_model::{GrainIdentifier, IntrospectedResource, SimplifiedEnvironmentDocument};
use envctx_sink::ArtifactSink;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::PipelineError;
use crate::events::{NoopNotifier, PipelineEvent, ProgressNotifier, Stage};
use crate::extract::extract_grain_names;
use crate::fetch::{fetch_environment, fetch_grain_resources};
use crate::outcome::PipelineOutcome;
use crate::serialize::{artifact_key, serialize};
use crate::transform::transform;
use crate::workflows::attach_workflows;

const DEFAULT_MAX_CONCURRENCY: usize = 4;

type TransformFn = fn(
  &serde_json::Value,
  &IndexMap<GrainIdentifier, Vec<IntrospectedResource>>,
) -> SimplifiedEnvironmentDocument;

/// Options for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  /// Maximum number of introspection or workflow requests in flight.
  /// `1` processes grains and resources strictly one at a time.
  pub max_concurrency: usize,
  /// Deadline for a whole run.
  pub run_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
  fn default() -> Self {
    Self {
      max_concurrency: DEFAULT_MAX_CONCURRENCY,
      run_timeout: None,
    }
  }
}

/// The environment context pipeline.
///
/// Generic over `N: ProgressNotifier` to allow different progress reporting.
/// Use `Pipeline::new()` for a pipeline with no-op notifications, or
/// `Pipeline::with_notifier()` to observe events.
pub struct Pipeline<S: EnvironmentService, N: ProgressNotifier = NoopNotifier> {
  service: S,
  notifier: N,
  options: PipelineOptions,
  transform: TransformFn,
}

impl<S: EnvironmentService> Pipeline<S, NoopNotifier> {
  /// Create a new pipeline with no-op notifications.
  pub fn new(service: S, options: PipelineOptions) -> Self {
    Self::with_notifier(service, NoopNotifier, options)
  }
}

impl<S: EnvironmentService, N: ProgressNotifier> Pipeline<S, N> {
  /// Create a new pipeline with a custom notifier.
  pub fn with_notifier(service: S, notifier: N, options: PipelineOptions) -> Self {
    Self {
      service,
      notifier,
      options,
      transform,
    }
  }

  /// Replace the transform stage.
  #[cfg(test)]
  fn with_transform(mut self, transform: TransformFn) -> Self {
    self.transform = transform;
    self
  }

  /// Get a reference to the environment service.
  pub fn service(&self) -> &S {
    &self.service
  }

  /// Get the options this pipeline runs with.
  pub fn options(&self) -> &PipelineOptions {
    &self.options
  }

  /// Run the pipeline and return the rendered artifact.
  pub async fn run(
    &self,
    space: &str,
    environment_id: &str,
    cancel: CancellationToken,
  ) -> Result<PipelineOutcome, PipelineError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    self.notify_started(&run_id, space, environment_id);

    let result = self
      .run_guarded(&run_id, space, environment_id, &cancel)
      .await;
    self.finish(&run_id, result)
  }

  /// Run the pipeline and hand the artifact to `sink`.
  ///
  /// The completion event carries the location reported by the sink. A sink
  /// failure fails the run.
  pub async fn run_to_sink(
    &self,
    space: &str,
    environment_id: &str,
    sink: &dyn ArtifactSink,
    cancel: CancellationToken,
  ) -> Result<PipelineOutcome, PipelineError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    self.notify_started(&run_id, space, environment_id);

    let result = match self
      .run_guarded(&run_id, space, environment_id, &cancel)
      .await
    {
      Ok(mut outcome) => {
        let key = artifact_key(space, environment_id);
        match sink.put(&key, &outcome.artifact).await {
          Ok(location) => {
            outcome.location = Some(location);
            Ok(outcome)
          }
          Err(source) => Err(PipelineError::Sink {
            space: space.to_string(),
            environment_id: environment_id.to_string(),
            source,
          }),
        }
      }
      Err(e) => Err(e),
    };
    self.finish(&run_id, result)
  }

  fn notify_started(&self, run_id: &str, space: &str, environment_id: &str) {
    self.notifier.notify(PipelineEvent::Started {
      run_id: run_id.to_string(),
      space: space.to_string(),
      environment_id: environment_id.to_string(),
    });
  }

  /// Emit the terminal event for a run.
  fn finish(
    &self,
    run_id: &str,
    result: Result<PipelineOutcome, PipelineError>,
  ) -> Result<PipelineOutcome, PipelineError> {
    match &result {
      Ok(outcome) => {
        info!(
          run_id = %run_id,
          grains = outcome.document.grains.len(),
          resources = outcome.document.resource_count(),
          workflows = outcome.document.workflow_count(),
          partial_failures = outcome.failures.len(),
          "pipeline_completed"
        );
        self.notifier.notify(PipelineEvent::Completed {
          run_id: run_id.to_string(),
          location: outcome.location.clone(),
          partial_failures: outcome.failures.len(),
        });
      }
      Err(e) => {
        error!(run_id = %run_id, error = %e, "pipeline_failed");
        self.notifier.notify(PipelineEvent::Failed {
          run_id: run_id.to_string(),
          error: e.to_string(),
        });
      }
    }
    result
  }

  /// Apply the run deadline and cancellation to the stage sequence.
  async fn run_guarded(
    &self,
    run_id: &str,
    space: &str,
    environment_id: &str,
    cancel: &CancellationToken,
  ) -> Result<PipelineOutcome, PipelineError> {
    let stages = self.run_stages(run_id, space, environment_id, cancel);
    let bounded = async {
      match self.options.run_timeout {
        Some(limit) => tokio::time::timeout(limit, stages)
          .await
          .unwrap_or_else(|_| {
            Err(PipelineError::TimedOut {
              space: space.to_string(),
              environment_id: environment_id.to_string(),
              timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
          }),
        None => stages.await,
      }
    };

    tokio::select! {
        result = bounded => result,
        _ = cancel.cancelled() => {
          warn!(run_id = %run_id, "pipeline cancelled");
          Err(cancelled(space, environment_id))
        }
    }
  }

  #[instrument(
    name = "pipeline_run",
    skip_all,
    fields(run_id = %run_id, space = %space, environment_id = %environment_id)
  )]
  async fn run_stages(
    &self,
    run_id: &str,
    space: &str,
    environment_id: &str,
    cancel: &CancellationToken,
  ) -> Result<PipelineOutcome, PipelineError> {
    let concurrency = self.options.max_concurrency;

    // 1. Fetch environment
    checkpoint(cancel, space, environment_id)?;
    let raw = fetch_environment(&self.service, space, environment_id).await?;
    self.progress(
      run_id,
      Stage::FetchEnvironment,
      format!("Fetched environment {environment_id} in space {space}"),
    );

    // 2. Extract grains
    let grains = extract_grain_names(&raw);
    self.progress(
      run_id,
      Stage::ExtractGrains,
      format!("Found {} grains", grains.len()),
    );

    // 3. Fetch grain resources
    checkpoint(cancel, space, environment_id)?;
    let fetched =
      fetch_grain_resources(&self.service, space, environment_id, &grains, concurrency).await;
    let mut failures = fetched.failures;
    self.progress(
      run_id,
      Stage::FetchGrainResources,
      with_failures(
        format!("Fetched resources for {} grains", fetched.resources.len()),
        failures.len(),
      ),
    );

    // 4. Transform
    checkpoint(cancel, space, environment_id)?;
    let document = transform_isolated(self.transform, raw, fetched.resources)
      .await
      .map_err(|message| PipelineError::Transform {
        space: space.to_string(),
        environment_id: environment_id.to_string(),
        message,
      })?;
    self.progress(
      run_id,
      Stage::Transform,
      format!("Transformed {} grains", document.grains.len()),
    );

    // 5. Aggregate workflows
    checkpoint(cancel, space, environment_id)?;
    let resource_failures_before = failures.len();
    let attached =
      attach_workflows(&self.service, space, environment_id, document, concurrency).await;
    failures.extend(attached.failures);
    let document = attached.document;
    self.progress(
      run_id,
      Stage::AggregateWorkflows,
      with_failures(
        format!("Attached {} workflows", document.workflow_count()),
        failures.len() - resource_failures_before,
      ),
    );

    // 6. Serialize
    let artifact = serialize(&document).map_err(|e| PipelineError::Serialize {
      space: space.to_string(),
      environment_id: environment_id.to_string(),
      message: e.to_string(),
    })?;
    self.progress(
      run_id,
      Stage::Serialize,
      format!("Rendered context ({} bytes)", artifact.len()),
    );

    Ok(PipelineOutcome {
      run_id: run_id.to_string(),
      document,
      artifact,
      failures,
      location: None,
    })
  }

  fn progress(&self, run_id: &str, stage: Stage, message: String) {
    info!(run_id = %run_id, stage = stage.label(), "{message}");
    self.notifier.notify(PipelineEvent::Progress {
      run_id: run_id.to_string(),
      stage,
      message,
      increment_percent: stage.increment_percent(),
    });
  }
}

fn cancelled(space: &str, environment_id: &str) -> PipelineError {
  PipelineError::Cancelled {
    space: space.to_string(),
    environment_id: environment_id.to_string(),
  }
}

fn checkpoint(
  cancel: &CancellationToken,
  space: &str,
  environment_id: &str,
) -> Result<(), PipelineError> {
  if cancel.is_cancelled() {
    return Err(cancelled(space, environment_id));
  }
  Ok(())
}

fn with_failures(message: String, failures: usize) -> String {
  if failures == 0 {
    message
  } else {
    format!("{message} ({failures} failed)")
  }
}

/// Run the transform on the blocking pool so that a panic surfaces as an
/// error instead of unwinding through the caller.
async fn transform_isolated(
  transform: TransformFn,
  raw: serde_json::Value,
  resources: IndexMap<GrainIdentifier, Vec<IntrospectedResource>>,
) -> Result<SimplifiedEnvironmentDocument, String> {
  run_isolated(move || transform(&raw, &resources)).await
}

async fn run_isolated<T, F>(f: F) -> Result<T, String>
where
  T: Send + 'static,
  F: FnOnce() -> T + Send + 'static,
{
  tokio::task::spawn_blocking(f).await.map_err(|e| {
    if e.is_panic() {
      panic_message(e.into_panic())
    } else {
      format!("task join error: {e}")
    }
  })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "panic with non-string payload".to_string()
  }
}
