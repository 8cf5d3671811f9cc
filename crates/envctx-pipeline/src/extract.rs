//! Grain extraction from the raw environment description.

use std::collections::HashSet;

use envctx_model::GrainIdentifier;
use serde_json::Value;

/// JSON pointer to the grain records of an environment.
pub(crate) const GRAINS_POINTER: &str = "/details/state/grains";

/// Named grain records in remote order.
///
/// Records without a non-empty string `name` are skipped. A repeated name
/// keeps its first record only.
pub(crate) fn grain_records(raw: &Value) -> Vec<(&str, &Value)> {
  let Some(grains) = raw.pointer(GRAINS_POINTER).and_then(Value::as_array) else {
    return Vec::new();
  };

  let mut seen = HashSet::new();
  grains
    .iter()
    .filter_map(|record| {
      let name = record.get("name").and_then(Value::as_str)?;
      (!name.is_empty() && seen.insert(name)).then_some((name, record))
    })
    .collect()
}

/// Pull the grain identifiers out of a raw environment description.
///
/// Never fails: a missing or malformed grain list yields an empty result.
pub fn extract_grain_names(raw: &Value) -> Vec<GrainIdentifier> {
  grain_records(raw)
    .into_iter()
    .map(|(name, _)| name.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_extracts_names_in_order() {
    let raw = json!({
      "details": { "state": { "grains": [
        { "name": "web" }, { "name": "db" }, { "name": "cache" }
      ]}}
    });

    assert_eq!(extract_grain_names(&raw), vec!["web", "db", "cache"]);
  }

  #[test]
  fn test_skips_grains_without_name() {
    let raw = json!({
      "details": { "state": { "grains": [
        { "name": "web" }, { "kind": "terraform" }, { "name": 42 }, { "name": "" }, "junk", { "name": "db" }
      ]}}
    });

    assert_eq!(extract_grain_names(&raw), vec!["web", "db"]);
  }

  #[test]
  fn test_duplicate_names_keep_first() {
    let raw = json!({
      "details": { "state": { "grains": [
        { "name": "web", "path": "a" }, { "name": "web", "path": "b" }
      ]}}
    });

    let records = grain_records(&raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1["path"], "a");
  }

  #[test]
  fn test_missing_or_malformed_path_is_empty() {
    for raw in [
      json!(null),
      json!({}),
      json!({ "details": {} }),
      json!({ "details": { "state": null } }),
      json!({ "details": { "state": { "grains": {} } } }),
      json!({ "details": { "state": { "grains": "web" } } }),
    ] {
      assert!(extract_grain_names(&raw).is_empty(), "raw: {raw}");
    }
  }
}
