//! MediaPackage v2 REST client and packaging resources.
//!
//! MediaPackage v2 organizes packaging as a tree: channel groups own
//! channels, and channels own origin endpoints that expose playback
//! manifests.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use super::{AwsCredentials, SigV4Signer};
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpRequest, RestClient};
use crate::tags::Tags;

/// Signing name of the MediaPackage v2 service.
pub const MEDIAPACKAGE_SERVICE: &str = "mediapackagev2";

/// Segment container of an origin endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    /// MPEG transport stream segments.
    #[default]
    Ts,
    /// Common media application format segments.
    Cmaf,
}

/// A channel group known to an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub name: String,
    pub arn: String,
    pub egress_domain: Option<String>,
    pub channels: Vec<Channel>,
}

/// A channel inside a channel group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub arn: String,
    /// Ingest URLs MediaLive pushes to.
    pub ingest_endpoints: Vec<String>,
    pub origin_endpoints: Vec<OriginEndpoint>,
}

/// A playback endpoint of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginEndpoint {
    pub name: String,
    pub arn: String,
    pub container_type: ContainerType,
    /// URL of the first HLS manifest, if any.
    pub url: Option<String>,
}

/// Body of `CreateChannelGroup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateChannelGroupRequest {
    pub channel_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Tags,
}

/// Body of `CreateChannel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateChannelRequest {
    pub channel_name: String,
    pub tags: Tags,
}

/// Body of `CreateOriginEndpoint`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateOriginEndpointRequest {
    pub origin_endpoint_name: String,
    pub container_type: ContainerType,
    pub segment: serde_json::Value,
    pub hls_manifests: Vec<serde_json::Value>,
    pub tags: Tags,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChannelGroupResponse {
    pub channel_group_name: String,
    pub arn: String,
    #[serde(default)]
    pub egress_domain: Option<String>,
}

impl From<ChannelGroupResponse> for ChannelGroup {
    fn from(response: ChannelGroupResponse) -> Self {
        Self {
            name: response.channel_group_name,
            arn: response.arn,
            egress_domain: response.egress_domain,
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct IngestEndpointResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChannelResponse {
    pub channel_name: String,
    pub arn: String,
    #[serde(default)]
    pub ingest_endpoints: Vec<IngestEndpointResponse>,
}

impl From<ChannelResponse> for Channel {
    fn from(response: ChannelResponse) -> Self {
        Self {
            name: response.channel_name,
            arn: response.arn,
            ingest_endpoints: response
                .ingest_endpoints
                .into_iter()
                .filter_map(|endpoint| endpoint.url)
                .collect(),
            origin_endpoints: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ManifestResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct OriginEndpointResponse {
    pub origin_endpoint_name: String,
    pub arn: String,
    pub container_type: ContainerType,
    #[serde(default)]
    pub hls_manifests: Vec<ManifestResponse>,
}

impl From<OriginEndpointResponse> for OriginEndpoint {
    fn from(response: OriginEndpointResponse) -> Self {
        Self {
            name: response.origin_endpoint_name,
            arn: response.arn,
            container_type: response.container_type,
            url: response
                .hls_manifests
                .into_iter()
                .find_map(|manifest| manifest.url),
        }
    }
}

/// MediaPackage v2 operations used by the AWS adapter.
#[async_trait]
pub trait MediaPackageApi: Send + Sync {
    /// `POST /channelGroup`.
    async fn create_channel_group(
        &self,
        request: &CreateChannelGroupRequest,
    ) -> Result<ApiResponse>;

    /// `POST /channelGroup/{group}/channel`.
    async fn create_channel(
        &self,
        channel_group: &str,
        request: &CreateChannelRequest,
    ) -> Result<ApiResponse>;

    /// `POST /channelGroup/{group}/channel/{channel}/originEndpoint`.
    async fn create_origin_endpoint(
        &self,
        channel_group: &str,
        channel: &str,
        request: &CreateOriginEndpointRequest,
    ) -> Result<ApiResponse>;
}

/// MediaPackage v2 client signing requests with SigV4.
#[derive(Debug, Clone)]
pub struct MediaPackageClient {
    http: RestClient,
    signer: SigV4Signer,
    base_url: Url,
}

impl MediaPackageClient {
    /// Creates a client for the credentials' region.
    pub fn new(http: RestClient, credentials: &AwsCredentials) -> Result<Self> {
        let base_url = format!("https://mediapackagev2.{}.amazonaws.com/", credentials.region);
        let base_url = Url::parse(&base_url).map_err(|e| {
            Error::configuration(format!("invalid AWS region {:?}", credentials.region))
                .with_source(e)
        })?;

        Ok(Self {
            http,
            signer: SigV4Signer::new(credentials.clone(), MEDIAPACKAGE_SERVICE),
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("MediaPackage base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post(&self, url: Url, body: &impl Serialize) -> Result<ApiResponse> {
        let request = HttpRequest::new(MEDIAPACKAGE_SERVICE, Method::POST, url).with_json(body)?;
        self.http.send(self.signer.sign(request)?).await
    }
}

#[async_trait]
impl MediaPackageApi for MediaPackageClient {
    async fn create_channel_group(
        &self,
        request: &CreateChannelGroupRequest,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(&["channelGroup"])?;
        self.post(url, request).await
    }

    async fn create_channel(
        &self,
        channel_group: &str,
        request: &CreateChannelRequest,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(&["channelGroup", channel_group, "channel"])?;
        self.post(url, request).await
    }

    async fn create_origin_endpoint(
        &self,
        channel_group: &str,
        channel: &str,
        request: &CreateOriginEndpointRequest,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(&[
            "channelGroup",
            channel_group,
            "channel",
            channel,
            "originEndpoint",
        ])?;
        self.post(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpConfig;

    fn client() -> MediaPackageClient {
        let http = RestClient::new(HttpConfig::default()).unwrap();
        let credentials = AwsCredentials::new("AKIA", "secret", "eu-west-1");
        MediaPackageClient::new(http, &credentials).unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let url = client()
            .endpoint(&["channelGroup", "group 1", "channel"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://mediapackagev2.eu-west-1.amazonaws.com/channelGroup/group%201/channel"
        );
    }

    #[test]
    fn test_channel_from_response() {
        let response: ChannelResponse = serde_json::from_value(json!({
            "ChannelName": "channel",
            "Arn": "arn:aws:mediapackagev2:eu-west-1:1:channelGroup/g/channel/channel",
            "IngestEndpoints": [{ "Id": "1", "Url": "https://ingest/1" }, { "Id": "2" }],
        }))
        .unwrap();

        let channel = Channel::from(response);
        assert_eq!(channel.name, "channel");
        assert_eq!(channel.ingest_endpoints, vec!["https://ingest/1".to_string()]);
    }

    #[test]
    fn test_origin_endpoint_from_response() {
        let response: OriginEndpointResponse = serde_json::from_value(json!({
            "OriginEndpointName": "hls",
            "Arn": "arn",
            "ContainerType": "CMAF",
            "HlsManifests": [{ "ManifestName": "index", "Url": "https://egress/index.m3u8" }],
        }))
        .unwrap();

        let endpoint = OriginEndpoint::from(response);
        assert_eq!(endpoint.container_type, ContainerType::Cmaf);
        assert_eq!(endpoint.url.as_deref(), Some("https://egress/index.m3u8"));
    }

    #[test]
    fn test_channel_group_request_omits_missing_description() {
        let request = CreateChannelGroupRequest {
            channel_group_name: "group".to_string(),
            description: None,
            tags: Tags::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ChannelGroupName"], "group");
        assert!(value.get("Description").is_none());
    }
}
