//! MediaLive REST client.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{AwsCredentials, AwsInputType, SigV4Signer};
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpRequest, RestClient};
use crate::tags::Tags;

/// Signing name of the MediaLive service.
pub const MEDIALIVE_SERVICE: &str = "medialive";

/// CIDR accepted by the input security groups this crate creates.
pub const OPEN_CIDR: &str = "0.0.0.0/0";

/// A CIDR allowed to push to an input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistRule {
    pub cidr: String,
}

/// Body of `CreateInputSecurityGroup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInputSecurityGroupRequest {
    pub whitelist_rules: Vec<WhitelistRule>,
    pub tags: Tags,
}

impl CreateInputSecurityGroupRequest {
    /// A group open to every address.
    pub fn open(tags: Tags) -> Self {
        Self {
            whitelist_rules: vec![WhitelistRule {
                cidr: OPEN_CIDR.to_string(),
            }],
            tags,
        }
    }
}

/// Push destination of an input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDestinationRequest {
    pub stream_name: String,
}

/// Body of `CreateInput`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInputRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: AwsInputType,
    pub destinations: Vec<InputDestinationRequest>,
    pub input_security_groups: Vec<String>,
    pub tags: Tags,
}

/// MediaLive operations used by the AWS adapter.
///
/// Implementations return the raw response; validating it is up to the
/// caller.
#[async_trait]
pub trait MediaLiveApi: Send + Sync {
    /// `POST /prod/inputSecurityGroups`.
    async fn create_input_security_group(
        &self,
        request: &CreateInputSecurityGroupRequest,
    ) -> Result<ApiResponse>;

    /// `POST /prod/inputs`.
    async fn create_input(&self, request: &CreateInputRequest) -> Result<ApiResponse>;

    /// `POST /prod/channels` with a full channel descriptor.
    async fn create_channel(&self, descriptor: &Value) -> Result<ApiResponse>;
}

/// MediaLive client signing requests with SigV4.
#[derive(Debug, Clone)]
pub struct MediaLiveClient {
    http: RestClient,
    signer: SigV4Signer,
    base_url: Url,
}

impl MediaLiveClient {
    /// Creates a client for the credentials' region.
    pub fn new(http: RestClient, credentials: &AwsCredentials) -> Result<Self> {
        let base_url = format!("https://medialive.{}.amazonaws.com/prod/", credentials.region);
        let base_url = Url::parse(&base_url).map_err(|e| {
            Error::configuration(format!("invalid AWS region {:?}", credentials.region))
                .with_source(e)
        })?;

        Ok(Self {
            http,
            signer: SigV4Signer::new(credentials.clone(), MEDIALIVE_SERVICE),
            base_url,
        })
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<ApiResponse> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::configuration("invalid MediaLive path").with_source(e))?;
        let request = HttpRequest::new(MEDIALIVE_SERVICE, Method::POST, url).with_json(body)?;
        self.http.send(self.signer.sign(request)?).await
    }
}

#[async_trait]
impl MediaLiveApi for MediaLiveClient {
    async fn create_input_security_group(
        &self,
        request: &CreateInputSecurityGroupRequest,
    ) -> Result<ApiResponse> {
        self.post("inputSecurityGroups", request).await
    }

    async fn create_input(&self, request: &CreateInputRequest) -> Result<ApiResponse> {
        self.post("inputs", request).await
    }

    async fn create_channel(&self, descriptor: &Value) -> Result<ApiResponse> {
        self.post("channels", descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpConfig;
    use crate::tags;

    #[test]
    fn test_create_input_request_wire_shape() {
        let request = CreateInputRequest {
            name: "my_stream".to_string(),
            input_type: AwsInputType::RtmpPush,
            destinations: vec![InputDestinationRequest {
                stream_name: "my_stream".to_string(),
            }],
            input_security_groups: vec!["123".to_string()],
            tags: tags::normalize(None),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "my_stream",
                "type": "RTMP_PUSH",
                "destinations": [{ "streamName": "my_stream" }],
                "inputSecurityGroups": ["123"],
                "tags": { "Created By": "sendlive" },
            })
        );
    }

    #[test]
    fn test_open_security_group() {
        let request = CreateInputSecurityGroupRequest::open(tags::default_tags());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["whitelistRules"][0]["cidr"], "0.0.0.0/0");
    }

    #[test]
    fn test_client_rejects_invalid_region() {
        let http = RestClient::new(HttpConfig::default()).unwrap();
        let credentials = AwsCredentials::new("AKIA", "secret", "bad region/");
        let error = MediaLiveClient::new(http, &credentials).unwrap_err();
        assert_eq!(error.kind, crate::ErrorKind::Configuration);
    }
}
