use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::de;

/// A concrete infrastructure resource realized by a grain, as reported by
/// the introspection endpoint.
///
/// The service is not consistent about field casing, so camelCase aliases are
/// accepted alongside the snake_case names. `null` or non-string values never
/// reject the resource; see [`crate::de`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedResource {
  #[serde(default, deserialize_with = "de::text")]
  pub name: String,

  #[serde(rename = "type", default, deserialize_with = "de::text")]
  pub resource_type: String,

  #[serde(
    default,
    alias = "dependencyIdentifier",
    deserialize_with = "de::text"
  )]
  pub dependency_identifier: String,

  #[serde(
    default,
    deserialize_with = "de::text_map",
    skip_serializing_if = "Option::is_none"
  )]
  pub attributes: Option<BTreeMap<String, String>>,

  #[serde(
    default,
    deserialize_with = "de::text_map",
    skip_serializing_if = "Option::is_none"
  )]
  pub tags: Option<BTreeMap<String, String>>,

  #[serde(
    default,
    alias = "dependsOn",
    deserialize_with = "de::text_list",
    skip_serializing_if = "Option::is_none"
  )]
  pub depends_on: Option<Vec<String>>,
}

impl IntrospectedResource {
  /// Reduce the resource to the fields kept in the simplified document.
  pub fn summary(&self) -> ResourceSummary {
    ResourceSummary {
      name: self.name.clone(),
      resource_type: self.resource_type.clone(),
    }
  }
}

/// The `{name, type}` view of a resource kept in the simplified document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
  pub name: String,
  #[serde(rename = "type")]
  pub resource_type: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_snake_case_resource() {
    let resource: IntrospectedResource = serde_json::from_value(serde_json::json!({
      "name": "web-bucket",
      "type": "aws_s3_bucket",
      "dependency_identifier": "module.web.aws_s3_bucket.this",
      "attributes": { "region": "us-east-1" },
      "depends_on": ["aws_iam_role.web"]
    }))
    .unwrap();

    assert_eq!(resource.name, "web-bucket");
    assert_eq!(resource.resource_type, "aws_s3_bucket");
    assert_eq!(
      resource.dependency_identifier,
      "module.web.aws_s3_bucket.this"
    );
    assert_eq!(
      resource.attributes.as_ref().and_then(|a| a.get("region")),
      Some(&"us-east-1".to_string())
    );
    assert_eq!(resource.tags, None);
    assert_eq!(resource.depends_on, Some(vec!["aws_iam_role.web".to_string()]));
  }

  #[test]
  fn test_deserialize_camel_case_aliases() {
    let resource: IntrospectedResource = serde_json::from_value(serde_json::json!({
      "name": "db",
      "type": "aws_db_instance",
      "dependencyIdentifier": "aws_db_instance.db",
      "dependsOn": []
    }))
    .unwrap();

    assert_eq!(resource.dependency_identifier, "aws_db_instance.db");
    assert_eq!(resource.depends_on, Some(vec![]));
  }

  #[test]
  fn test_summary_keeps_name_and_type() {
    let resource = IntrospectedResource {
      name: "queue".to_string(),
      resource_type: "aws_sqs_queue".to_string(),
      dependency_identifier: "aws_sqs_queue.queue".to_string(),
      ..Default::default()
    };

    assert_eq!(
      resource.summary(),
      ResourceSummary {
        name: "queue".to_string(),
        resource_type: "aws_sqs_queue".to_string(),
      }
    );
  }

  #[test]
  fn test_deserialize_tolerates_nulls_and_scalars() {
    let resource: IntrospectedResource = serde_json::from_value(serde_json::json!({
      "name": "db",
      "type": "aws_db_instance",
      "dependency_identifier": null,
      "attributes": { "port": 5432, "multi_az": true, "engine": "postgres" },
      "tags": null,
      "depends_on": null
    }))
    .unwrap();

    assert_eq!(resource.name, "db");
    assert_eq!(resource.resource_type, "aws_db_instance");
    assert_eq!(resource.dependency_identifier, "");
    let attributes = resource.attributes.unwrap();
    assert_eq!(attributes["port"], "5432");
    assert_eq!(attributes["multi_az"], "true");
    assert_eq!(attributes["engine"], "postgres");
    assert_eq!(resource.tags, None);
    assert_eq!(resource.depends_on, None);
  }
}
