//! Envctx Sink
//!
//! This crate provides the destination for finished context artifacts.
//! The pipeline renders an environment into a single text document and hands
//! it to an [`ArtifactSink`] under a key derived from the space and
//! environment. Where and how the artifact is kept is up to the implementation.

mod fs;

pub use fs::FsSink;

use async_trait::async_trait;

/// Error type for artifact sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
  /// The requested artifact was not found.
  #[error("artifact not found: {0}")]
  NotFound(String),

  /// The key cannot be mapped to a storage location.
  #[error("invalid artifact key: {0}")]
  InvalidKey(String),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Artifact sink trait.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
  /// Store an artifact, replacing any previous artifact under the same key.
  ///
  /// Returns a human-readable location for the stored artifact (a file path
  /// for the filesystem sink) so the caller can point the user at it.
  async fn put(&self, key: &str, artifact: &str) -> Result<String, SinkError>;

  /// Retrieve an artifact by key.
  async fn get(&self, key: &str) -> Result<String, SinkError>;
}
