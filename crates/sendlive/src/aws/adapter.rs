//! AWS provisioning workflow.

use serde::Deserialize;
use serde_json::Value;
use strum::{AsRefStr, Display};

use super::builder::EncoderChannelBuilder;
use super::mediapackage::{ChannelGroupResponse, ChannelResponse, OriginEndpointResponse};
use super::{
    AwsCredentials, AwsOptions, AwsSession, Channel, ChannelGroup, ContainerType,
    CreateChannelGroupRequest, CreateChannelRequest, CreateInputRequest,
    CreateInputSecurityGroupRequest, CreateOriginEndpointRequest, InputDestinationRequest,
    OriginEndpoint, TRACING_TARGET, defaults,
};
use crate::credentials::ServiceProvider;
use crate::error::{Error, Result};
use crate::http::ApiResponse;
use crate::stream::Stream;
use crate::tags::{self, Tags};

/// Lifecycle of an [`AwsAdapter`].
///
/// `Failed` is fatal to the step that reached it: the error is returned and
/// nothing created earlier is rolled back. The adapter itself stays usable
/// for further calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AwsState {
    /// No session yet.
    #[default]
    Unconfigured,
    /// MediaLive and MediaPackage clients are available.
    SessionReady,
    /// Security group and input are being created.
    StreamProvisioning,
    /// The input exists and has an ingest URL.
    StreamReady,
    /// The last step returned an error.
    Failed,
}

/// A MediaLive push input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLiveInput {
    /// Input id, when MediaLive returned one.
    pub id: Option<String>,
    /// Ingest URL of the single destination.
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupEnvelope {
    #[serde(rename = "securityGroup")]
    security_group: Option<IdField>,
}

#[derive(Debug, Deserialize)]
struct IdField {
    id: Option<String>,
}

/// Provisions streams on MediaLive, with MediaPackage v2 packaging.
///
/// Calls are single-shot and resources created by earlier steps are not
/// removed when a later step fails.
#[derive(Debug)]
pub struct AwsAdapter {
    credentials: AwsCredentials,
    options: AwsOptions,
    session: Option<AwsSession>,
    state: AwsState,
    channel_groups: Vec<ChannelGroup>,
}

impl AwsAdapter {
    /// Creates an adapter without a session.
    pub fn new(credentials: AwsCredentials, options: Option<AwsOptions>) -> Self {
        Self {
            credentials,
            options: options.unwrap_or_default(),
            session: None,
            state: AwsState::Unconfigured,
            channel_groups: Vec::new(),
        }
    }

    /// Creates an adapter around an existing session.
    pub fn with_session(
        credentials: AwsCredentials,
        options: Option<AwsOptions>,
        session: AwsSession,
    ) -> Self {
        let mut adapter = Self::new(credentials, options);
        adapter.session = Some(session);
        adapter.state = AwsState::SessionReady;
        adapter
    }

    /// Builds the session. Calling it again keeps the existing session.
    pub fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let session = AwsSession::new(self.credentials.clone(), self.options.http.clone())
            .inspect_err(|_| self.state = AwsState::Failed)?;

        tracing::debug!(
            target: TRACING_TARGET,
            region = %self.credentials.region,
            "AWS session ready"
        );

        self.session = Some(session);
        self.state = AwsState::SessionReady;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AwsState {
        self.state
    }

    /// Options in effect.
    pub fn options(&self) -> &AwsOptions {
        &self.options
    }

    /// Channel groups created through this adapter.
    pub fn channel_groups(&self) -> &[ChannelGroup] {
        &self.channel_groups
    }

    fn session(&self) -> Result<&AwsSession> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::configuration("AWS session is not set up, call connect first"))
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = AwsState::Failed;
        }
        result
    }

    /// Provisions an RTMP input and returns its stream.
    ///
    /// The security group is `security_group_id` if given, else the one in
    /// [`AwsOptions`], else a freshly created open group.
    pub async fn create_stream(
        &mut self,
        name: &str,
        security_group_id: Option<&str>,
        tags: Option<&Tags>,
    ) -> Result<Stream> {
        self.session()?;
        self.state = AwsState::StreamProvisioning;

        tracing::info!(target: TRACING_TARGET, stream = name, "Provisioning AWS stream");

        let security_group_id = match security_group_id
            .map(str::to_string)
            .or_else(|| self.options.input_security_group_id.clone())
        {
            Some(id) => id,
            None => self.create_input_security_group(tags).await?,
        };

        let input = self.create_input(name, &security_group_id, tags).await?;
        self.state = AwsState::StreamReady;

        Ok(Stream::new(name, ServiceProvider::Aws).with_endpoint(input.endpoint))
    }

    /// Creates an input security group open to every address and returns
    /// its id.
    pub async fn create_input_security_group(&mut self, tags: Option<&Tags>) -> Result<String> {
        let result = self.create_input_security_group_inner(tags).await;
        self.track(result)
    }

    async fn create_input_security_group_inner(&self, tags: Option<&Tags>) -> Result<String> {
        let medialive = self.session()?.medialive()?;
        let request = CreateInputSecurityGroupRequest::open(tags::normalize(tags));
        let response = medialive.create_input_security_group(&request).await?;

        tracing::info!(
            target: TRACING_TARGET,
            status = response.status,
            response = %response.body,
            "Input security group response"
        );

        if !response.is_created() {
            return Err(Error::provider(format!(
                "failed to create input security group, expected 201 Created, got {}",
                response.status
            ))
            .with_response(response.to_diagnostic()));
        }

        let envelope: SecurityGroupEnvelope = response.parse("create input security group")?;
        envelope
            .security_group
            .and_then(|group| group.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::provider("created input security group did not return an id")
                    .with_response(response.to_diagnostic())
            })
    }

    /// Creates a push input named `name` behind the given security group.
    pub async fn create_input(
        &mut self,
        name: &str,
        security_group_id: &str,
        tags: Option<&Tags>,
    ) -> Result<MediaLiveInput> {
        let result = self.create_input_inner(name, security_group_id, tags).await;
        self.track(result)
    }

    async fn create_input_inner(
        &self,
        name: &str,
        security_group_id: &str,
        tags: Option<&Tags>,
    ) -> Result<MediaLiveInput> {
        let medialive = self.session()?.medialive()?;
        let request = CreateInputRequest {
            name: name.to_string(),
            input_type: self.options.input_type,
            destinations: vec![InputDestinationRequest {
                stream_name: name.to_string(),
            }],
            input_security_groups: vec![security_group_id.to_string()],
            tags: tags::normalize(tags),
        };

        let response = medialive.create_input(&request).await?;

        tracing::info!(
            target: TRACING_TARGET,
            stream = name,
            status = response.status,
            response = %response.body,
            "MediaLive input response"
        );

        parse_input(name, &response)
    }

    /// Creates a MediaPackage v2 channel group and remembers it.
    pub async fn create_channel_group(
        &mut self,
        name: &str,
        description: Option<&str>,
        tags: Option<&Tags>,
    ) -> Result<ChannelGroup> {
        let result = self.create_channel_group_inner(name, description, tags).await;
        let group = self.track(result)?;
        self.channel_groups.push(group.clone());
        Ok(group)
    }

    async fn create_channel_group_inner(
        &self,
        name: &str,
        description: Option<&str>,
        tags: Option<&Tags>,
    ) -> Result<ChannelGroup> {
        let mediapackage = self.session()?.mediapackage()?;
        let request = CreateChannelGroupRequest {
            channel_group_name: name.to_string(),
            description: description.map(str::to_string),
            tags: tags::normalize(tags),
        };

        let response = mediapackage.create_channel_group(&request).await?;
        log_packaging_response("channel group", name, &response);
        ensure_created("create channel group", &response)?;

        let group: ChannelGroupResponse = response.parse("create channel group")?;
        Ok(group.into())
    }

    /// Creates a MediaPackage v2 channel.
    ///
    /// The channel goes into the first group this adapter created. Naming a
    /// group explicitly is not supported and fails before any vendor call.
    pub async fn create_channel(
        &mut self,
        channel_group: Option<&str>,
        name: &str,
        tags: Option<&Tags>,
    ) -> Result<Channel> {
        if let Some(group) = channel_group {
            return Err(Error::unimplemented(format!(
                "adding a channel to a named channel group ({group}) is not supported"
            )));
        }

        let Some(group) = self.channel_groups.first().map(|group| group.name.clone()) else {
            return Err(Error::configuration(
                "no MediaPackage channel groups are associated with this adapter, create one first",
            ));
        };

        let result = self.create_channel_inner(&group, name, tags).await;
        let channel = self.track(result)?;
        self.channel_groups[0].channels.push(channel.clone());
        Ok(channel)
    }

    async fn create_channel_inner(
        &self,
        channel_group: &str,
        name: &str,
        tags: Option<&Tags>,
    ) -> Result<Channel> {
        let mediapackage = self.session()?.mediapackage()?;
        let request = CreateChannelRequest {
            channel_name: name.to_string(),
            tags: tags::normalize(tags),
        };

        let response = mediapackage.create_channel(channel_group, &request).await?;
        log_packaging_response("channel", name, &response);
        ensure_created("create channel", &response)?;

        let channel: ChannelResponse = response.parse("create channel")?;
        Ok(channel.into())
    }

    /// Creates an origin endpoint with the default HLS manifest.
    ///
    /// The endpoint is attached to the cached channel when this adapter
    /// created it.
    pub async fn create_origin_endpoint(
        &mut self,
        channel_group: &str,
        channel: &str,
        name: &str,
        container_type: ContainerType,
        tags: Option<&Tags>,
    ) -> Result<OriginEndpoint> {
        let result = self
            .create_origin_endpoint_inner(channel_group, channel, name, container_type, tags)
            .await;
        let endpoint = self.track(result)?;

        if let Some(cached) = self
            .channel_groups
            .iter_mut()
            .filter(|group| group.name == channel_group)
            .flat_map(|group| group.channels.iter_mut())
            .find(|known| known.name == channel)
        {
            cached.origin_endpoints.push(endpoint.clone());
        }

        Ok(endpoint)
    }

    async fn create_origin_endpoint_inner(
        &self,
        channel_group: &str,
        channel: &str,
        name: &str,
        container_type: ContainerType,
        tags: Option<&Tags>,
    ) -> Result<OriginEndpoint> {
        let mediapackage = self.session()?.mediapackage()?;
        let request = CreateOriginEndpointRequest {
            origin_endpoint_name: name.to_string(),
            container_type,
            segment: defaults::origin_endpoint_segment(),
            hls_manifests: vec![defaults::hls_manifest("index")],
            tags: tags::normalize(tags),
        };

        let response = mediapackage
            .create_origin_endpoint(channel_group, channel, &request)
            .await?;
        log_packaging_response("origin endpoint", name, &response);
        ensure_created("create origin endpoint", &response)?;

        let endpoint: OriginEndpointResponse = response.parse("create origin endpoint")?;
        Ok(endpoint.into())
    }

    /// Creates a MediaLive encoder channel reading `input_id` and publishing
    /// the default ladder to a MediaPackage channel.
    ///
    /// Returns the raw channel description.
    pub async fn create_encoder_channel(
        &mut self,
        name: &str,
        input_id: &str,
        mediapackage_channel_id: &str,
        tags: Option<&Tags>,
    ) -> Result<Value> {
        let result = self
            .create_encoder_channel_inner(name, input_id, mediapackage_channel_id, tags)
            .await;
        self.track(result)
    }

    async fn create_encoder_channel_inner(
        &self,
        name: &str,
        input_id: &str,
        mediapackage_channel_id: &str,
        tags: Option<&Tags>,
    ) -> Result<Value> {
        let medialive = self.session()?.medialive()?;
        let descriptor = EncoderChannelBuilder::new(name, input_id, mediapackage_channel_id)
            .with_role_arn(self.options.channel_role_arn.clone())
            .with_tags(tags.cloned())
            .build();

        let response = medialive.create_channel(&descriptor).await?;

        tracing::info!(
            target: TRACING_TARGET,
            channel = name,
            status = response.status,
            response = %response.body,
            "MediaLive channel response"
        );

        ensure_created("create MediaLive channel", &response)?;
        Ok(response.body)
    }
}

fn parse_input(name: &str, response: &ApiResponse) -> Result<MediaLiveInput> {
    let fail = |message: String| {
        Error::provider(format!("failed to create input for stream {name}: {message}"))
            .with_response(response.to_diagnostic())
    };

    if !response.is_success() {
        return Err(fail(format!("unexpected HTTP status {}", response.status)));
    }

    let input = &response.body["input"];
    let destinations = input["destinations"]
        .as_array()
        .ok_or_else(|| fail("response has no destinations".to_string()))?;

    if destinations.len() != 1 {
        return Err(fail(format!(
            "expected 1 destination, got {}",
            destinations.len()
        )));
    }

    let endpoint = destinations[0]["url"]
        .as_str()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| fail("no endpoint URL returned".to_string()))?;

    Ok(MediaLiveInput {
        id: input["id"].as_str().map(str::to_string),
        endpoint: endpoint.to_string(),
    })
}

fn ensure_created(context: &str, response: &ApiResponse) -> Result<()> {
    if response.is_created() {
        return Ok(());
    }

    Err(Error::provider(format!(
        "{context}: expected 201 Created, got {}",
        response.status
    ))
    .with_response(response.to_diagnostic()))
}

fn log_packaging_response(resource: &str, name: &str, response: &ApiResponse) {
    tracing::info!(
        target: TRACING_TARGET,
        resource,
        name,
        status = response.status,
        response = %response.body,
        "MediaPackage response"
    );
}
