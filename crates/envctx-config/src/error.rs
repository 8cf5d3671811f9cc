use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("failed to read config file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The config file is not valid JSON or has unknown fields.
  #[error("invalid config file {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// A setting has an unusable value.
  #[error("invalid value for '{field}': {message}")]
  Invalid {
    field: &'static str,
    message: String,
  },

  /// A required setting was not provided anywhere.
  #[error("'{field}' is required (set it in the config file, flag or {env})")]
  Missing {
    field: &'static str,
    env: &'static str,
  },

  /// The home directory is needed for a default path but is unknown.
  #[error("could not determine home directory")]
  NoHomeDirectory,
}
