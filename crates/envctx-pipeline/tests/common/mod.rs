//! In-memory environment service for pipeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use envctx_client::{ClientError, EnvironmentService};
use envctx_model::{IntrospectedResource, WorkflowInput, WorkflowInstantiation};
use serde_json::{Value, json};

/// A request observed by [`FakeService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Environment {
    space: String,
    environment_id: String,
  },
  Introspection {
    grain: String,
  },
  Workflows {
    grain_path: String,
    resource: String,
  },
}

#[derive(Default)]
pub struct FakeService {
  environment: Option<Value>,
  environment_delay: Option<Duration>,
  resources: HashMap<String, Vec<IntrospectedResource>>,
  workflows: HashMap<(String, String), Vec<WorkflowInstantiation>>,
  failing_grains: HashSet<String>,
  failing_resources: HashSet<(String, String)>,
  calls: Mutex<Vec<Call>>,
}

impl FakeService {
  pub fn new(environment: Value) -> Self {
    Self {
      environment: Some(environment),
      ..Default::default()
    }
  }

  /// A service whose environment endpoint always fails.
  pub fn unavailable() -> Self {
    Self::default()
  }

  pub fn with_environment_delay(mut self, delay: Duration) -> Self {
    self.environment_delay = Some(delay);
    self
  }

  pub fn with_resources(mut self, grain: &str, resources: Vec<IntrospectedResource>) -> Self {
    self.resources.insert(grain.to_string(), resources);
    self
  }

  pub fn with_workflows(
    mut self,
    grain_path: &str,
    resource: &str,
    workflows: Vec<WorkflowInstantiation>,
  ) -> Self {
    self
      .workflows
      .insert((grain_path.to_string(), resource.to_string()), workflows);
    self
  }

  pub fn failing_grain(mut self, grain: &str) -> Self {
    self.failing_grains.insert(grain.to_string());
    self
  }

  pub fn failing_resource(mut self, grain_path: &str, resource: &str) -> Self {
    self
      .failing_resources
      .insert((grain_path.to_string(), resource.to_string()));
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }
}

fn server_error(path: String) -> ClientError {
  ClientError::Status { path, status: 500 }
}

#[async_trait]
impl EnvironmentService for FakeService {
  async fn get_environment(
    &self,
    space: &str,
    environment_id: &str,
  ) -> Result<Value, ClientError> {
    self.record(Call::Environment {
      space: space.to_string(),
      environment_id: environment_id.to_string(),
    });
    if let Some(delay) = self.environment_delay {
      tokio::time::sleep(delay).await;
    }
    self
      .environment
      .clone()
      .ok_or_else(|| server_error(format!("environments/{space}/{environment_id}")))
  }

  async fn get_introspection(
    &self,
    _space: &str,
    _environment_id: &str,
    grain: &str,
  ) -> Result<Vec<IntrospectedResource>, ClientError> {
    self.record(Call::Introspection {
      grain: grain.to_string(),
    });
    if self.failing_grains.contains(grain) {
      return Err(server_error(format!("grains/{grain}/introspection")));
    }
    Ok(self.resources.get(grain).cloned().unwrap_or_default())
  }

  async fn get_workflows(
    &self,
    _space: &str,
    _environment_id: &str,
    grain_path: &str,
    resource: &str,
  ) -> Result<Vec<WorkflowInstantiation>, ClientError> {
    self.record(Call::Workflows {
      grain_path: grain_path.to_string(),
      resource: resource.to_string(),
    });
    let key = (grain_path.to_string(), resource.to_string());
    if self.failing_resources.contains(&key) {
      return Err(server_error(format!(
        "resources/{grain_path}/{resource}/workflows"
      )));
    }
    Ok(self.workflows.get(&key).cloned().unwrap_or_default())
  }
}

pub fn resource(name: &str, resource_type: &str) -> IntrospectedResource {
  IntrospectedResource {
    name: name.to_string(),
    resource_type: resource_type.to_string(),
    ..Default::default()
  }
}

pub fn workflow(blueprint_name: &str, inputs: &[(&str, &str)]) -> WorkflowInstantiation {
  WorkflowInstantiation {
    blueprint_name: blueprint_name.to_string(),
    inputs: inputs
      .iter()
      .map(|(name, input_type)| WorkflowInput {
        name: name.to_string(),
        input_type: input_type.to_string(),
      })
      .collect(),
  }
}

/// A raw environment with one grain per `(name, path)` pair.
pub fn environment(grains: &[(&str, &str)]) -> Value {
  let grains: Vec<Value> = grains
    .iter()
    .map(|(name, path)| {
      json!({
        "name": name,
        "path": path,
        "kind": "terraform",
        "execution_host": "agent-1",
        "inputs": [{ "name": "size", "value": "small" }],
        "state": {
          "current_state": "Deployed",
          "stages": [
            { "name": "Deploy", "activities": [{ "name": "apply", "status": "Done" }] }
          ]
        }
      })
    })
    .collect();

  json!({
    "details": {
      "id": "env-1",
      "computed_status": "Active",
      "definition": {
        "metadata": { "space_name": "prod" },
        "inputs": [{ "name": "region", "value": "eu-west-1" }]
      },
      "state": { "grains": grains }
    }
  })
}
