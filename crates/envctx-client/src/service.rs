use async_trait::async_trait;
use envctx_model::{IntrospectedResource, WorkflowInstantiation};

use crate::error::ClientError;

/// The remote environment service as seen by the pipeline.
///
/// Implementations must reject empty parameters before issuing a request.
#[async_trait]
pub trait EnvironmentService: Send + Sync {
  /// Fetch the raw environment description.
  ///
  /// A missing or `null` payload is an error.
  async fn get_environment(
    &self,
    space: &str,
    environment_id: &str,
  ) -> Result<serde_json::Value, ClientError>;

  /// List the infrastructure resources realized by a grain.
  async fn get_introspection(
    &self,
    space: &str,
    environment_id: &str,
    grain: &str,
  ) -> Result<Vec<IntrospectedResource>, ClientError>;

  /// List the workflow instantiations bound to one resource of a grain.
  async fn get_workflows(
    &self,
    space: &str,
    environment_id: &str,
    grain_path: &str,
    resource: &str,
  ) -> Result<Vec<WorkflowInstantiation>, ClientError>;
}
