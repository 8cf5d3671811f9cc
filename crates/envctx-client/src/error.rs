use thiserror::Error;

/// Errors returned by the environment service client.
#[derive(Debug, Error)]
pub enum ClientError {
  /// A required path parameter was empty.
  #[error("missing required parameter: {name}")]
  MissingParameter { name: &'static str },

  /// The configured base URL cannot be used.
  #[error("invalid base url '{url}': {message}")]
  InvalidBaseUrl { url: String, message: String },

  /// The request could not be sent or the response could not be read.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-success status.
  #[error("request to '{path}' failed with status {status}")]
  Status { path: String, status: u16 },

  /// The service answered successfully but without a payload.
  #[error("empty response from '{path}'")]
  EmptyPayload { path: String },

  /// The payload did not have the expected shape.
  #[error("invalid response from '{path}': {message}")]
  Decode { path: String, message: String },
}

impl ClientError {
  /// Whether the error came from a request that exceeded its timeout.
  pub fn is_timeout(&self) -> bool {
    matches!(self, ClientError::Http(e) if e.is_timeout())
  }
}
