//! Normalization of the raw environment into the simplified document.
//!
//! Paths read from the raw description:
//!
//! ```text
//! details.id                              -> environmentId
//! details.computed_status                 -> status
//! details.definition.metadata.space_name  -> spaceName
//! details.definition.inputs[{name,value}] -> inputs
//! details.state.grains[]                  -> grains
//!   .path, .kind, .execution_host, .inputs[{name,value}]
//!   .state.current_state
//!   .state.stages[].activities[{name,status}]
//! ```
//!
//! Every lookup is defensive. A missing field becomes an empty string or an
//! empty list; nothing here returns an error.

use envctx_model::{
  Activity, GrainDetails, GrainIdentifier, GrainState, InputValue, IntrospectedResource,
  SimplifiedEnvironmentDocument,
};
use indexmap::IndexMap;
use serde_json::Value;

use crate::extract::grain_records;

/// Build the simplified document from the raw description and the
/// introspected resources of each grain.
///
/// A grain's resources are looked up by exact grain name. Workflows are left
/// empty; they are attached by a later stage.
pub fn transform(
  raw: &Value,
  resources: &IndexMap<GrainIdentifier, Vec<IntrospectedResource>>,
) -> SimplifiedEnvironmentDocument {
  let grains = grain_records(raw)
    .into_iter()
    .map(|(name, record)| {
      let details = grain_details(record, resources.get(name).map(Vec::as_slice));
      (name.to_string(), details)
    })
    .collect();

  SimplifiedEnvironmentDocument {
    environment_id: text_at(raw, "/details/id"),
    space_name: text_at(raw, "/details/definition/metadata/space_name"),
    status: text_at(raw, "/details/computed_status"),
    inputs: input_pairs(raw.pointer("/details/definition/inputs")),
    grains,
  }
}

fn grain_details(record: &Value, resources: Option<&[IntrospectedResource]>) -> GrainDetails {
  GrainDetails {
    path: text_at(record, "/path"),
    kind: text_at(record, "/kind"),
    execution_host: execution_host(record),
    inputs: input_pairs(record.get("inputs")),
    state: GrainState {
      current_state: text_at(record, "/state/current_state"),
      activities: activities(record.pointer("/state/stages")),
    },
    resources: resources
      .unwrap_or_default()
      .iter()
      .map(IntrospectedResource::summary)
      .collect(),
    workflows: Vec::new(),
  }
}

/// The execution host is usually a plain string but some grain kinds report
/// an object with a `name`.
fn execution_host(record: &Value) -> String {
  match record.get("execution_host") {
    Some(Value::Object(host)) => host.get("name").and_then(scalar_text).unwrap_or_default(),
    Some(other) => scalar_text(other).unwrap_or_default(),
    None => String::new(),
  }
}

/// Flatten `stages[].activities[]` in stage order, then activity order.
fn activities(stages: Option<&Value>) -> Vec<Activity> {
  let Some(stages) = stages.and_then(Value::as_array) else {
    return Vec::new();
  };

  stages
    .iter()
    .filter_map(|stage| stage.get("activities").and_then(Value::as_array))
    .flatten()
    .filter(|activity| activity.is_object())
    .map(|activity| Activity {
      name: text_at(activity, "/name"),
      status: text_at(activity, "/status"),
    })
    .collect()
}

/// `{name, value}` pairs; entries missing either field are dropped.
fn input_pairs(list: Option<&Value>) -> Vec<InputValue> {
  let Some(list) = list.and_then(Value::as_array) else {
    return Vec::new();
  };

  list
    .iter()
    .filter_map(|entry| {
      Some(InputValue {
        name: entry.get("name").and_then(scalar_text)?,
        value: entry.get("value").and_then(scalar_text)?,
      })
    })
    .collect()
}

fn text_at(value: &Value, pointer: &str) -> String {
  value
    .pointer(pointer)
    .and_then(scalar_text)
    .unwrap_or_default()
}

/// Render a scalar as text. Null, arrays and objects have no text form.
fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn resource(name: &str, resource_type: &str) -> IntrospectedResource {
    IntrospectedResource {
      name: name.to_string(),
      resource_type: resource_type.to_string(),
      ..Default::default()
    }
  }

  fn sample_raw() -> Value {
    json!({
      "details": {
        "id": "env-1",
        "computed_status": "active",
        "definition": {
          "metadata": { "space_name": "prod" },
          "inputs": [
            { "name": "region", "value": "us-east-1" },
            { "name": "replicas", "value": 3 },
            { "name": "orphan" },
            { "value": "no-name" }
          ]
        },
        "state": {
          "grains": [
            {
              "name": "web",
              "path": "modules/web",
              "kind": "terraform",
              "execution_host": "eks-prod",
              "inputs": [ { "name": "size", "value": "small" } ],
              "state": {
                "current_state": "deployed",
                "stages": [
                  { "name": "prepare", "activities": [
                    { "name": "init", "status": "done" },
                    { "name": "plan", "status": "done" }
                  ]},
                  { "name": "deploy", "activities": [
                    { "name": "apply", "status": "running" }
                  ]}
                ]
              }
            },
            { "name": "db", "kind": "helm", "execution_host": { "name": "agent-2" } }
          ]
        }
      }
    })
  }

  #[test]
  fn test_environment_fields() {
    let doc = transform(&sample_raw(), &IndexMap::new());

    assert_eq!(doc.environment_id, "env-1");
    assert_eq!(doc.space_name, "prod");
    assert_eq!(doc.status, "active");
    assert_eq!(
      doc.inputs,
      vec![
        InputValue {
          name: "region".to_string(),
          value: "us-east-1".to_string()
        },
        InputValue {
          name: "replicas".to_string(),
          value: "3".to_string()
        },
      ]
    );
  }

  #[test]
  fn test_grain_fields_and_flattened_activities() {
    let doc = transform(&sample_raw(), &IndexMap::new());
    let web = &doc.grains["web"];

    assert_eq!(web.path, "modules/web");
    assert_eq!(web.kind, "terraform");
    assert_eq!(web.execution_host, "eks-prod");
    assert_eq!(web.inputs.len(), 1);
    assert_eq!(web.state.current_state, "deployed");

    let names: Vec<_> = web.state.activities.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["init", "plan", "apply"]);
    assert_eq!(web.state.activities[2].status, "running");
  }

  #[test]
  fn test_missing_grain_fields_default_to_blank() {
    let doc = transform(&sample_raw(), &IndexMap::new());
    let db = &doc.grains["db"];

    assert_eq!(db.path, "");
    assert_eq!(db.execution_host, "agent-2");
    assert!(db.inputs.is_empty());
    assert_eq!(db.state, GrainState::default());
    assert!(db.resources.is_empty());
    assert!(db.workflows.is_empty());
  }

  #[test]
  fn test_grain_order_follows_remote_order() {
    let doc = transform(&sample_raw(), &IndexMap::new());
    let keys: Vec<_> = doc.grains.keys().cloned().collect();
    assert_eq!(keys, vec!["web", "db"]);
  }

  #[test]
  fn test_resources_attached_by_exact_grain_name() {
    let mut resources = IndexMap::new();
    resources.insert(
      "web".to_string(),
      vec![resource("bucket", "aws_s3_bucket"), resource("role", "aws_iam_role")],
    );
    resources.insert("WEB".to_string(), vec![resource("other", "x")]);
    resources.insert("unknown".to_string(), vec![resource("stray", "x")]);

    let doc = transform(&sample_raw(), &resources);

    let web = &doc.grains["web"];
    assert_eq!(web.resources.len(), 2);
    assert_eq!(web.resources[0].name, "bucket");
    assert_eq!(web.resources[1].resource_type, "aws_iam_role");
    assert!(doc.grains["db"].resources.is_empty());
    assert!(!doc.grains.contains_key("unknown"));
  }

  #[test]
  fn test_empty_raw_yields_empty_document() {
    for raw in [json!(null), json!({}), json!({ "details": [] })] {
      assert_eq!(
        transform(&raw, &IndexMap::new()),
        SimplifiedEnvironmentDocument::default()
      );
    }
  }

  #[test]
  fn test_stages_without_activities_are_skipped() {
    let raw = json!({
      "details": { "state": { "grains": [
        { "name": "web", "state": { "stages": [
          { "name": "empty" },
          { "name": "bad", "activities": "nope" },
          { "name": "ok", "activities": [ { "name": "apply" }, "junk" ] }
        ]}}
      ]}}
    });

    let doc = transform(&raw, &IndexMap::new());
    assert_eq!(
      doc.grains["web"].state.activities,
      vec![Activity {
        name: "apply".to_string(),
        status: String::new()
      }]
    );
  }
}
