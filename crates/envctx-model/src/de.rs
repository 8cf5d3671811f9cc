//! Tolerant field decoders for the wire types.
//!
//! The service sends `null` for absent values and mixes scalar types in
//! string maps. One odd field must not reject a whole response, so these
//! decoders fold such values into defaults or text.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` decodes as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any scalar decodes as its text; `null` as an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(value_text).unwrap_or_default())
}

/// An object of scalars decodes as a string map. Nested values are kept as
/// JSON text, `null` entries are dropped, and a non-object is `None`.
pub fn text_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(Value::Object(entries)) = Option::<Value>::deserialize(deserializer)? else {
    return Ok(None);
  };

  Ok(Some(
    entries
      .into_iter()
      .filter_map(|(key, value)| value_text(&value).map(|text| (key, text)))
      .collect(),
  ))
}

/// An array decodes as a string list without its `null` items; anything
/// else is `None`.
pub fn text_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(Value::Array(items)) = Option::<Value>::deserialize(deserializer)? else {
    return Ok(None);
  };

  Ok(Some(items.iter().filter_map(value_text).collect()))
}

fn value_text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}
