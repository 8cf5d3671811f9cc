//! Rendering of the simplified document into the context artifact.

use envctx_model::SimplifiedEnvironmentDocument;

/// Render the document as YAML.
///
/// Keys follow struct field order and grains keep their document order, so
/// the same document always renders to the same bytes. The document is a
/// tree, so no anchors or aliases are ever emitted.
pub fn serialize(document: &SimplifiedEnvironmentDocument) -> Result<String, serde_yaml::Error> {
  serde_yaml::to_string(document)
}

/// Storage key for the artifact of an environment: `{space}-{env}.yaml`.
///
/// Characters outside `[A-Za-z0-9._-]` are replaced with `_` so the key is a
/// single safe file name.
pub fn artifact_key(space: &str, environment_id: &str) -> String {
  let sanitize = |s: &str| -> String {
    s.chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
          c
        } else {
          '_'
        }
      })
      .collect()
  };
  format!("{}-{}.yaml", sanitize(space), sanitize(environment_id))
}
