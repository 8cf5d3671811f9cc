//! Pipeline error types.

use envctx_client::ClientError;
use envctx_sink::SinkError;

/// Errors that end a pipeline run.
///
/// Per-grain and per-resource fetch failures are not represented here; they
/// are absorbed by the fan-out stages and reported as
/// [`ItemFailure`](crate::ItemFailure)s on the outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
  /// A required parameter was empty.
  #[error("missing required parameter: {name}")]
  MissingParameter { name: &'static str },

  /// The environment description could not be fetched.
  #[error("failed to fetch environment '{environment_id}' in space '{space}': {source}")]
  EnvironmentFetch {
    space: String,
    environment_id: String,
    #[source]
    source: ClientError,
  },

  /// The transform stage panicked. This is a bug, not a data problem.
  #[error("internal error transforming environment '{environment_id}' in space '{space}': {message}")]
  Transform {
    space: String,
    environment_id: String,
    message: String,
  },

  /// The document could not be rendered.
  #[error("failed to serialize environment '{environment_id}' in space '{space}': {message}")]
  Serialize {
    space: String,
    environment_id: String,
    message: String,
  },

  /// The run was cancelled.
  #[error("pipeline for environment '{environment_id}' in space '{space}' was cancelled")]
  Cancelled {
    space: String,
    environment_id: String,
  },

  /// The run exceeded its overall deadline.
  #[error("pipeline for environment '{environment_id}' in space '{space}' timed out after {timeout_ms}ms")]
  TimedOut {
    space: String,
    environment_id: String,
    timeout_ms: u64,
  },

  /// The artifact could not be handed to the sink.
  #[error("failed to store artifact for environment '{environment_id}' in space '{space}': {source}")]
  Sink {
    space: String,
    environment_id: String,
    #[source]
    source: SinkError,
  },
}
