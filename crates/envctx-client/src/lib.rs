//! Envctx Client
//!
//! Access to the remote environment service. The [`EnvironmentService`] trait
//! is the seam the pipeline is written against; [`HttpEnvironmentService`] is
//! the reqwest-backed implementation.
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/environments/{space}/{env}
//! GET {base}/environments/{space}/{env}/grains/{grain}/introspection
//! GET {base}/environments/{space}/{env}/resources/{grain_path}/{resource}/workflows
//! ```
//!
//! Every path segment is percent-encoded with [`encode_segment`]; log output
//! always shows the decoded values.

mod error;
mod http;
mod path;
mod service;

pub use error::ClientError;
pub use http::{ClientConfig, HttpEnvironmentService};
pub use path::{ApiPath, decode_segment, encode_segment};
pub use service::EnvironmentService;
