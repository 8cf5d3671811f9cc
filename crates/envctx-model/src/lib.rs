//! Envctx Model
//!
//! This crate contains the serializable types shared by the envctx crates.
//! They fall into two groups:
//!
//! - Wire types read from the remote environment service
//!   ([`IntrospectedResource`], [`WorkflowInstantiation`]).
//! - The simplified document produced by the pipeline
//!   ([`SimplifiedEnvironmentDocument`] and its parts), which is what gets
//!   rendered into the final context artifact.
//!
//! The raw environment description itself is deliberately not modelled here.
//! It is irregular and only a handful of paths are read from it, so the
//! pipeline walks it as a `serde_json::Value`.

pub mod de;
mod document;
mod resource;
mod workflow;

pub use document::{
  Activity, GrainDetails, GrainIdentifier, GrainState, InputValue, SimplifiedEnvironmentDocument,
};
pub use resource::{IntrospectedResource, ResourceSummary};
pub use workflow::{WorkflowInput, WorkflowInstantiation, WorkflowSummary};
