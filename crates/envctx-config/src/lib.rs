//! Envctx Config
//!
//! Settings for the envctx CLI. Values are layered, later layers winning:
//!
//! 1. defaults
//! 2. the JSON config file (`--config`, or `~/.envctx/config.json` if present)
//! 3. environment variables (`ENVCTX_BASE_URL`, `ENVCTX_TOKEN`)
//! 4. command line flags
//!
//! [`Config::resolve`] validates the result and produces [`Settings`].

mod config;
mod error;

pub use config::{
  BASE_URL_ENV, Config, Overrides, Settings, TOKEN_ENV, data_dir, default_config_path,
};
pub use error::ConfigError;
