//! Live Stream API client and long-running operations.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::ServiceAccountAuth;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, RestClient};
use crate::tags::Tags;

const LIVESTREAM_SERVICE: &str = "livestream";
const LIVESTREAM_BASE_URL: &str = "https://livestream.googleapis.com/v1/";

/// `@type` of a resolved input operation.
pub const INPUT_TYPE_URL: &str = "type.googleapis.com/google.cloud.video.livestream.v1.Input";

/// `@type` of a resolved channel operation.
pub const CHANNEL_TYPE_URL: &str = "type.googleapis.com/google.cloud.video.livestream.v1.Channel";

/// Error status of a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A long-running operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationStatus>,
    #[serde(default)]
    pub response: Option<Value>,
}

impl Operation {
    /// The resolved resource, `None` while the operation is running.
    ///
    /// A failed operation, or one that resolved to a resource other than
    /// `expected_type`, is a provider error.
    pub fn resolve(self, expected_type: &str) -> Result<Option<Value>> {
        if !self.done {
            return Ok(None);
        }

        if let Some(status) = self.error {
            return Err(Error::provider(format!(
                "operation {} failed with code {}: {}",
                self.name, status.code, status.message
            ))
            .with_operation(self.name));
        }

        let response = self.response.unwrap_or(Value::Null);
        if response["@type"].as_str() != Some(expected_type) {
            return Err(Error::provider(format!(
                "operation {} resolved to an unexpected resource, expected {expected_type}",
                self.name
            ))
            .with_operation(self.name)
            .with_response(response));
        }

        Ok(Some(response))
    }
}

/// A Live Stream API input endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEndpoint {
    /// Full resource name.
    pub name: String,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    /// Ingest URI.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub labels: Tags,
}

impl InputEndpoint {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Output location of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutput {
    #[serde(default)]
    pub uri: Option<String>,
}

/// A Live Stream API channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveChannel {
    /// Full resource name.
    pub name: String,
    #[serde(default)]
    pub streaming_state: Option<String>,
    #[serde(default)]
    pub output: Option<ChannelOutput>,
    #[serde(default)]
    pub labels: Tags,
}

/// Live Stream API operations used by the GCP adapter.
#[async_trait]
pub trait LiveStreamApi: Send + Sync {
    /// Starts creating an input under `parent`.
    async fn create_input(&self, parent: &str, input_id: &str, input: &Value)
    -> Result<Operation>;

    /// Fetches an input by full resource name.
    async fn get_input(&self, name: &str) -> Result<InputEndpoint>;

    /// Starts creating a channel under `parent`.
    async fn create_channel(
        &self,
        parent: &str,
        channel_id: &str,
        channel: &Value,
    ) -> Result<Operation>;

    /// Fetches an operation by full name.
    async fn get_operation(&self, name: &str) -> Result<Operation>;
}

/// Live Stream API client authenticated with a service account.
#[derive(Debug, Clone)]
pub struct LiveStreamClient {
    http: RestClient,
    auth: Arc<ServiceAccountAuth>,
    base_url: Url,
}

impl LiveStreamClient {
    /// Creates a client.
    pub fn new(http: RestClient, auth: Arc<ServiceAccountAuth>) -> Result<Self> {
        let base_url = Url::parse(LIVESTREAM_BASE_URL)
            .map_err(|e| Error::configuration("invalid Live Stream API URL").with_source(e))?;

        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    fn resource_url(&self, resource: &str) -> Result<Url> {
        self.base_url.join(resource).map_err(|e| {
            Error::configuration(format!("invalid resource name {resource:?}")).with_source(e)
        })
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: HttpRequest,
        context: &str,
    ) -> Result<T> {
        let token = self.auth.access_token().await?;
        let request = request.with_header("authorization", format!("Bearer {}", token.expose()));
        let response = self.http.send(request).await?.ensure_success(context)?;
        response.parse(context)
    }
}

#[async_trait]
impl LiveStreamApi for LiveStreamClient {
    async fn create_input(
        &self,
        parent: &str,
        input_id: &str,
        input: &Value,
    ) -> Result<Operation> {
        let mut url = self.resource_url(&format!("{parent}/inputs"))?;
        url.query_pairs_mut().append_pair("inputId", input_id);

        let request = HttpRequest::new(LIVESTREAM_SERVICE, Method::POST, url).with_json(input)?;
        self.send(request, "create input").await
    }

    async fn get_input(&self, name: &str) -> Result<InputEndpoint> {
        let request = HttpRequest::new(LIVESTREAM_SERVICE, Method::GET, self.resource_url(name)?);
        self.send(request, "get input").await
    }

    async fn create_channel(
        &self,
        parent: &str,
        channel_id: &str,
        channel: &Value,
    ) -> Result<Operation> {
        let mut url = self.resource_url(&format!("{parent}/channels"))?;
        url.query_pairs_mut().append_pair("channelId", channel_id);

        let request = HttpRequest::new(LIVESTREAM_SERVICE, Method::POST, url).with_json(channel)?;
        self.send(request, "create channel").await
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        let request = HttpRequest::new(LIVESTREAM_SERVICE, Method::GET, self.resource_url(name)?);
        self.send(request, "get operation").await
    }
}
