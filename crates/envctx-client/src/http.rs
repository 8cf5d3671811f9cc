use std::time::Duration;

use async_trait::async_trait;
use envctx_model::{IntrospectedResource, WorkflowInstantiation, de};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::path::ApiPath;
use crate::service::EnvironmentService;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpEnvironmentService`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the service API, e.g. `https://portal.example.com/api/spaces`.
  pub base_url: String,
  /// Optional bearer token sent with every request.
  pub token: Option<String>,
  /// Timeout applied to each individual request.
  pub request_timeout: Duration,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      token: None,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
    }
  }
}

/// Response body of the introspection endpoint.
#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
  #[serde(default, deserialize_with = "de::null_as_default")]
  resources: Vec<IntrospectedResource>,
}

/// Response body of the workflows endpoint.
#[derive(Debug, Deserialize)]
struct WorkflowsResponse {
  #[serde(default, deserialize_with = "de::null_as_default")]
  instantiations: Vec<WorkflowInstantiation>,
}

/// reqwest-backed [`EnvironmentService`].
#[derive(Debug, Clone)]
pub struct HttpEnvironmentService {
  client: Client,
  base_url: Url,
  token: Option<String>,
}

impl HttpEnvironmentService {
  /// Create a new client.
  ///
  /// # Errors
  /// Returns an error if the base URL is not an absolute http(s) URL or the
  /// underlying HTTP client cannot be built.
  pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
    let base_url = Url::parse(&config.base_url).map_err(|e| ClientError::InvalidBaseUrl {
      url: config.base_url.clone(),
      message: e.to_string(),
    })?;

    if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
      return Err(ClientError::InvalidBaseUrl {
        url: config.base_url,
        message: "expected an http or https url".to_string(),
      });
    }

    let client = Client::builder()
      .timeout(config.request_timeout)
      .user_agent(concat!("envctx/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      base_url,
      token: config.token,
    })
  }

  /// Get the base URL requests are resolved against.
  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url_for(&self, path: &ApiPath) -> Result<Url, ClientError> {
    let joined = format!(
      "{}/{}",
      self.base_url.as_str().trim_end_matches('/'),
      path.encoded()
    );
    Url::parse(&joined).map_err(|e| ClientError::InvalidBaseUrl {
      url: self.base_url.to_string(),
      message: e.to_string(),
    })
  }

  /// Issue a GET request and return the JSON payload.
  ///
  /// Non-success statuses, empty bodies and a literal `null` are errors.
  async fn get_json(&self, path: &ApiPath) -> Result<serde_json::Value, ClientError> {
    let url = self.url_for(path)?;
    debug!(path = %path, "sending request");

    let mut request = self.client.get(url).header(ACCEPT, "application/json");
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(ClientError::Status {
        path: path.to_string(),
        status: status.as_u16(),
      });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
      return Err(ClientError::EmptyPayload {
        path: path.to_string(),
      });
    }

    let value: serde_json::Value =
      serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: e.to_string(),
      })?;
    if value.is_null() {
      return Err(ClientError::EmptyPayload {
        path: path.to_string(),
      });
    }

    debug!(path = %path, status = status.as_u16(), bytes = body.len(), "response received");
    Ok(value)
  }

  async fn get_typed<T: DeserializeOwned>(&self, path: &ApiPath) -> Result<T, ClientError> {
    let value = self.get_json(path).await?;
    serde_json::from_value(value).map_err(|e| ClientError::Decode {
      path: path.to_string(),
      message: e.to_string(),
    })
  }
}

#[async_trait]
impl EnvironmentService for HttpEnvironmentService {
  async fn get_environment(
    &self,
    space: &str,
    environment_id: &str,
  ) -> Result<serde_json::Value, ClientError> {
    let path = ApiPath::environment(space, environment_id)?;
    self.get_json(&path).await
  }

  async fn get_introspection(
    &self,
    space: &str,
    environment_id: &str,
    grain: &str,
  ) -> Result<Vec<IntrospectedResource>, ClientError> {
    let path = ApiPath::introspection(space, environment_id, grain)?;
    let response: IntrospectionResponse = self.get_typed(&path).await?;
    Ok(response.resources)
  }

  async fn get_workflows(
    &self,
    space: &str,
    environment_id: &str,
    grain_path: &str,
    resource: &str,
  ) -> Result<Vec<WorkflowInstantiation>, ClientError> {
    let path = ApiPath::workflows(space, environment_id, grain_path, resource)?;
    let response: WorkflowsResponse = self.get_typed(&path).await?;
    Ok(response.instantiations)
  }
}
