use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{ArtifactSink, SinkError};

/// Filesystem-based artifact sink.
///
/// Each artifact is written to `{base_path}/{key}`. Parent directories are
/// created automatically. Keys must be relative and may not escape the base
/// path.
pub struct FsSink {
  base_path: PathBuf,
}

impl FsSink {
  /// Create a new filesystem sink with the given base path.
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  /// Get the base directory of the sink.
  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  fn key_to_path(&self, key: &str) -> Result<PathBuf, SinkError> {
    let relative = Path::new(key);
    let is_plain = !key.is_empty()
      && relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !is_plain {
      return Err(SinkError::InvalidKey(key.to_string()));
    }
    Ok(self.base_path.join(relative))
  }
}

#[async_trait]
impl ArtifactSink for FsSink {
  async fn put(&self, key: &str, artifact: &str) -> Result<String, SinkError> {
    let path = self.key_to_path(key)?;

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(&path).await?;
    file.write_all(artifact.as_bytes()).await?;
    file.flush().await?;

    debug!(path = %path.display(), bytes = artifact.len(), "artifact written");
    Ok(path.display().to_string())
  }

  async fn get(&self, key: &str) -> Result<String, SinkError> {
    let path = self.key_to_path(key)?;
    fs::read_to_string(&path).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        SinkError::NotFound(key.to_string())
      } else {
        SinkError::Io(e)
      }
    })
  }
}
