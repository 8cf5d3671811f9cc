use std::fmt;

use crate::error::ClientError;

/// Percent-encode a single path segment.
///
/// Everything except RFC 3986 unreserved characters is encoded, `/`
/// included, so a grain path like `modules/web` stays a single segment.
pub fn encode_segment(raw: &str) -> String {
  urlencoding::encode(raw).into_owned()
}

/// Decode a percent-encoded path segment back to its original value.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; the result is
/// only used for display and error attribution.
pub fn decode_segment(encoded: &str) -> String {
  String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes())).into_owned()
}

/// A request path relative to the service base URL, held in encoded form.
///
/// `Display` renders the decoded path so that logs and errors show the
/// values the caller passed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
  segments: Vec<String>,
}

impl ApiPath {
  /// `environments/{space}/{env}`
  pub fn environment(space: &str, environment_id: &str) -> Result<Self, ClientError> {
    let mut path = Self::root();
    path.push("space", space)?;
    path.push("environment_id", environment_id)?;
    Ok(path)
  }

  /// `environments/{space}/{env}/grains/{grain}/introspection`
  pub fn introspection(
    space: &str,
    environment_id: &str,
    grain: &str,
  ) -> Result<Self, ClientError> {
    let mut path = Self::environment(space, environment_id)?;
    path.push_literal("grains");
    path.push("grain", grain)?;
    path.push_literal("introspection");
    Ok(path)
  }

  /// `environments/{space}/{env}/resources/{grain_path}/{resource}/workflows`
  pub fn workflows(
    space: &str,
    environment_id: &str,
    grain_path: &str,
    resource: &str,
  ) -> Result<Self, ClientError> {
    let mut path = Self::environment(space, environment_id)?;
    path.push_literal("resources");
    path.push("grain_path", grain_path)?;
    path.push("resource", resource)?;
    path.push_literal("workflows");
    Ok(path)
  }

  fn root() -> Self {
    Self {
      segments: vec!["environments".to_string()],
    }
  }

  fn push(&mut self, name: &'static str, raw: &str) -> Result<(), ClientError> {
    if raw.trim().is_empty() {
      return Err(ClientError::MissingParameter { name });
    }
    self.segments.push(encode_segment(raw));
    Ok(())
  }

  fn push_literal(&mut self, literal: &str) {
    self.segments.push(literal.to_string());
  }

  /// The path as sent on the wire, without a leading slash.
  pub fn encoded(&self) -> String {
    self.segments.join("/")
  }

  /// The decoded value of every segment.
  pub fn decoded_segments(&self) -> Vec<String> {
    self.segments.iter().map(|s| decode_segment(s)).collect()
  }
}

impl fmt::Display for ApiPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, segment) in self.segments.iter().enumerate() {
      if i > 0 {
        f.write_str("/")?;
      }
      f.write_str(&decode_segment(segment))?;
    }
    Ok(())
  }
}
