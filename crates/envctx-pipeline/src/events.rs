//! Pipeline stages and progress events.
//!
//! Events are emitted while a run progresses so that a caller can drive a
//! progress indicator and tell the user when the artifact is ready.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The ordered stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  FetchEnvironment,
  ExtractGrains,
  FetchGrainResources,
  Transform,
  AggregateWorkflows,
  Serialize,
}

impl Stage {
  /// All stages in execution order.
  pub const ALL: [Stage; 6] = [
    Stage::FetchEnvironment,
    Stage::ExtractGrains,
    Stage::FetchGrainResources,
    Stage::Transform,
    Stage::AggregateWorkflows,
    Stage::Serialize,
  ];

  /// Share of the overall progress this stage accounts for. The increments
  /// of all stages sum to 100.
  pub fn increment_percent(self) -> u8 {
    match self {
      Stage::FetchEnvironment => 20,
      Stage::ExtractGrains => 10,
      Stage::FetchGrainResources => 25,
      Stage::Transform => 10,
      Stage::AggregateWorkflows => 25,
      Stage::Serialize => 10,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Stage::FetchEnvironment => "fetch environment",
      Stage::ExtractGrains => "extract grains",
      Stage::FetchGrainResources => "fetch grain resources",
      Stage::Transform => "transform",
      Stage::AggregateWorkflows => "aggregate workflows",
      Stage::Serialize => "serialize",
    }
  }
}

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineEvent {
  /// A run has started.
  Started {
    run_id: String,
    space: String,
    environment_id: String,
  },

  /// A stage has completed.
  Progress {
    run_id: String,
    stage: Stage,
    message: String,
    increment_percent: u8,
  },

  /// The run finished and the artifact is ready.
  ///
  /// `location` is set when the artifact was handed to a sink.
  Completed {
    run_id: String,
    location: Option<String>,
    partial_failures: usize,
  },

  /// The run failed.
  Failed { run_id: String, error: String },
}

/// Trait for receiving pipeline events.
pub trait ProgressNotifier: Send + Sync {
  /// Called when a pipeline event occurs.
  fn notify(&self, event: PipelineEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ProgressNotifier for NoopNotifier {
  fn notify(&self, _event: PipelineEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Event volume is a handful per run, so the channel is unbounded and the
/// pipeline never waits on a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<PipelineEvent>) -> Self {
    Self { sender }
  }
}

impl ProgressNotifier for ChannelNotifier {
  fn notify(&self, event: PipelineEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
