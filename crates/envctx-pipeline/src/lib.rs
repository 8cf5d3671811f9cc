//! Environment Context Pipeline
//!
//! This crate turns a deployed environment into a compact YAML context
//! document. It fetches the environment, introspects each grain, looks up the
//! workflows that apply to each resource, and renders the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Pipeline                            │
//! │  - run(space, env, cancel) → PipelineOutcome                │
//! │  - run_to_sink(space, env, sink, cancel)                    │
//! │  - progress events via ProgressNotifier                     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Stages                             │
//! │  fetch environment → extract grains → fetch grain resources │
//! │  → transform → aggregate workflows → serialize              │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    EnvironmentService                       │
//! │  - environment, introspection and workflow lookups          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Introspection and workflow lookups fan out with bounded concurrency. A
//! failed lookup never fails the run: the grain gets no resources, or the
//! resource contributes no workflows, and the failure is listed on the
//! [`PipelineOutcome`].
//!
//! # Usage
//!
//! ```ignore
//! use envctx_client::{ClientConfig, HttpEnvironmentService};
//! use envctx_pipeline::{Pipeline, PipelineOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let service = HttpEnvironmentService::new(ClientConfig::new("https://portal.example.com/api"))?;
//! let pipeline = Pipeline::new(service, PipelineOptions::default());
//!
//! let outcome = pipeline.run("prod", "env-1", CancellationToken::new()).await?;
//! println!("{}", outcome.artifact);
//! ```

mod error;
mod events;
mod extract;
mod fetch;
mod orchestrator;
mod outcome;
mod serialize;
mod transform;
mod workflows;

pub use error::PipelineError;
pub use events::{ChannelNotifier, NoopNotifier, PipelineEvent, ProgressNotifier, Stage};
pub use extract::extract_grain_names;
pub use fetch::{GrainResources, fetch_environment, fetch_grain_resources};
pub use orchestrator::{Pipeline, PipelineOptions};
pub use outcome::{ItemFailure, PipelineOutcome};
pub use serialize::{artifact_key, serialize};
pub use transform::transform;
pub use workflows::{AttachedWorkflows, attach_workflows, group_workflows};
