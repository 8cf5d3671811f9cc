use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

pub const BASE_URL_ENV: &str = "ENVCTX_BASE_URL";
pub const TOKEN_ENV: &str = "ENVCTX_TOKEN";

const DATA_DIR: &str = ".envctx";
const CONFIG_FILE: &str = "config.json";
const CONTEXT_DIR: &str = "context";

/// Contents of the config file.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Base URL of the environment service API.
  pub base_url: Option<String>,

  /// Bearer token sent with every request.
  pub token: Option<String>,

  /// Timeout for each individual request, in milliseconds.
  pub request_timeout_ms: u64,

  /// Deadline for a whole run, in milliseconds. No deadline when unset.
  pub run_timeout_ms: Option<u64>,

  /// Maximum number of introspection or workflow requests in flight.
  pub max_concurrency: usize,

  /// Directory the context artifacts are written to.
  /// Defaults to `~/.envctx/context`.
  pub output_dir: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url: None,
      token: None,
      request_timeout_ms: 30_000,
      run_timeout_ms: None,
      max_concurrency: 4,
      output_dir: None,
    }
  }
}

/// Values given on the command line. Set fields win over the file and the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub base_url: Option<String>,
  pub output_dir: Option<PathBuf>,
  pub max_concurrency: Option<usize>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub base_url: String,
  pub token: Option<String>,
  pub request_timeout: Duration,
  pub run_timeout: Option<Duration>,
  pub max_concurrency: usize,
  pub output_dir: PathBuf,
}

/// `~/.envctx`
pub fn data_dir() -> Result<PathBuf, ConfigError> {
  dirs::home_dir()
    .map(|home| home.join(DATA_DIR))
    .ok_or(ConfigError::NoHomeDirectory)
}

/// `~/.envctx/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
  Ok(data_dir()?.join(CONFIG_FILE))
}

impl Config {
  /// Load the config file.
  ///
  /// An explicit `path` must exist. Without one, `~/.envctx/config.json` is
  /// read if present and defaults are used otherwise.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::from_file(path),
      None => {
        let path = default_config_path()?;
        if path.exists() {
          Self::from_file(&path)
        } else {
          debug!(path = %path.display(), "no config file, using defaults");
          Ok(Self::default())
        }
      }
    }
  }

  /// Read and parse a config file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
  }

  /// Apply environment variables, looked up through `var`.
  ///
  /// Empty values are ignored.
  pub fn apply_env<F>(&mut self, var: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
    if let Some(base_url) = non_empty(BASE_URL_ENV) {
      self.base_url = Some(base_url);
    }
    if let Some(token) = non_empty(TOKEN_ENV) {
      self.token = Some(token);
    }
  }

  /// Apply command line overrides.
  pub fn apply_overrides(&mut self, overrides: Overrides) {
    if let Some(base_url) = overrides.base_url {
      self.base_url = Some(base_url);
    }
    if let Some(output_dir) = overrides.output_dir {
      self.output_dir = Some(output_dir);
    }
    if let Some(max_concurrency) = overrides.max_concurrency {
      self.max_concurrency = max_concurrency;
    }
  }

  /// The config with the token masked, for display.
  pub fn redacted(&self) -> Self {
    Self {
      token: self.token.as_ref().map(|_| "********".to_string()),
      ..self.clone()
    }
  }

  /// Validate the config and resolve defaults into [`Settings`].
  pub fn resolve(self) -> Result<Settings, ConfigError> {
    let base_url = self
      .base_url
      .filter(|url| !url.trim().is_empty())
      .ok_or(ConfigError::Missing {
        field: "base_url",
        env: BASE_URL_ENV,
      })?;

    if self.max_concurrency == 0 {
      return Err(ConfigError::Invalid {
        field: "max_concurrency",
        message: "must be at least 1".to_string(),
      });
    }
    if self.request_timeout_ms == 0 {
      return Err(ConfigError::Invalid {
        field: "request_timeout_ms",
        message: "must be greater than 0".to_string(),
      });
    }
    if self.run_timeout_ms == Some(0) {
      return Err(ConfigError::Invalid {
        field: "run_timeout_ms",
        message: "must be greater than 0".to_string(),
      });
    }

    let output_dir = match self.output_dir {
      Some(dir) => dir,
      None => data_dir()?.join(CONTEXT_DIR),
    };

    Ok(Settings {
      base_url,
      token: self.token,
      request_timeout: Duration::from_millis(self.request_timeout_ms),
      run_timeout: self.run_timeout_ms.map(Duration::from_millis),
      max_concurrency: self.max_concurrency,
      output_dir,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn with_base_url() -> Config {
    Config {
      base_url: Some("https://portal.example.com/api".to_string()),
      output_dir: Some(PathBuf::from("/tmp/ctx")),
      ..Default::default()
    }
  }

  #[test]
  fn test_empty_object_gives_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.request_timeout_ms, 30_000);
    assert_eq!(config.max_concurrency, 4);
  }

  #[test]
  fn test_unknown_fields_rejected() {
    let result: Result<Config, _> = serde_json::from_str(r#"{ "base_ur": "x" }"#);
    assert!(result.is_err());
  }

  #[test]
  fn test_resolve_defaults() {
    let settings = with_base_url().resolve().unwrap();

    assert_eq!(settings.base_url, "https://portal.example.com/api");
    assert_eq!(settings.request_timeout, Duration::from_secs(30));
    assert_eq!(settings.run_timeout, None);
    assert_eq!(settings.max_concurrency, 4);
    assert_eq!(settings.output_dir, PathBuf::from("/tmp/ctx"));
  }

  #[test]
  fn test_resolve_requires_base_url() {
    let err = Config::default().resolve().unwrap_err();
    assert!(matches!(err, ConfigError::Missing { field: "base_url", .. }));

    let config = Config {
      base_url: Some("  ".to_string()),
      ..Default::default()
    };
    assert!(matches!(
      config.resolve().unwrap_err(),
      ConfigError::Missing { .. }
    ));
  }

  #[test]
  fn test_resolve_rejects_zero_values() {
    let config = Config {
      max_concurrency: 0,
      ..with_base_url()
    };
    assert!(matches!(
      config.resolve().unwrap_err(),
      ConfigError::Invalid { field: "max_concurrency", .. }
    ));

    let config = Config {
      request_timeout_ms: 0,
      ..with_base_url()
    };
    assert!(matches!(
      config.resolve().unwrap_err(),
      ConfigError::Invalid { field: "request_timeout_ms", .. }
    ));

    let config = Config {
      run_timeout_ms: Some(0),
      ..with_base_url()
    };
    assert!(matches!(
      config.resolve().unwrap_err(),
      ConfigError::Invalid { field: "run_timeout_ms", .. }
    ));
  }

  #[test]
  fn test_precedence_file_env_flags() {
    let mut config = Config {
      base_url: Some("https://file.example.com".to_string()),
      token: Some("file-token".to_string()),
      ..Default::default()
    };

    config.apply_env(|name| match name {
      BASE_URL_ENV => Some("https://env.example.com".to_string()),
      TOKEN_ENV => Some(String::new()),
      _ => None,
    });
    assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));
    assert_eq!(config.token.as_deref(), Some("file-token"));

    config.apply_overrides(Overrides {
      base_url: Some("https://flag.example.com".to_string()),
      output_dir: None,
      max_concurrency: Some(1),
    });
    assert_eq!(config.base_url.as_deref(), Some("https://flag.example.com"));
    assert_eq!(config.max_concurrency, 1);
    assert_eq!(config.output_dir, None);
  }

  #[test]
  fn test_redacted_masks_token() {
    let config = Config {
      token: Some("secret".to_string()),
      ..with_base_url()
    };

    let shown = serde_json::to_string(&config.redacted()).unwrap();
    assert!(!shown.contains("secret"));
    assert_eq!(config.redacted().base_url, config.base_url);
  }
}
