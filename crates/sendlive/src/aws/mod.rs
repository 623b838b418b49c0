//! AWS MediaLive and MediaPackage v2 provisioning.
//!
//! A stream on AWS is a MediaLive push input behind an input security group.
//! Packaging through MediaPackage v2 (channel groups, channels, origin
//! endpoints) and MediaLive encoder channels are available on the adapter
//! as separate steps.

mod adapter;
mod builder;
mod config;
pub mod defaults;
mod medialive;
mod mediapackage;
mod session;
mod sigv4;

pub use adapter::{AwsAdapter, AwsState, MediaLiveInput};
pub use builder::EncoderChannelBuilder;
pub use config::{AwsCredentials, AwsInputType, AwsOptions};
pub use medialive::{
    CreateInputRequest, CreateInputSecurityGroupRequest, InputDestinationRequest,
    MEDIALIVE_SERVICE, MediaLiveApi, MediaLiveClient, OPEN_CIDR, WhitelistRule,
};
pub use mediapackage::{
    Channel, ChannelGroup, ContainerType, CreateChannelGroupRequest, CreateChannelRequest,
    CreateOriginEndpointRequest, MEDIAPACKAGE_SERVICE, MediaPackageApi, MediaPackageClient,
    OriginEndpoint,
};
pub use session::AwsSession;
pub use sigv4::SigV4Signer;

/// Tracing target for AWS operations.
pub const TRACING_TARGET: &str = "sendlive::aws";
