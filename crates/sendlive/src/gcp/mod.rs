//! GCP Live Stream API and Cloud Storage provisioning.
//!
//! A stream on GCP is a push input and a channel attached to it, writing
//! HLS output into a folder of a Cloud Storage bucket. The bucket is named
//! explicitly, discovered by its provenance label, or created on demand.

mod adapter;
mod auth;
mod builder;
mod config;
pub mod defaults;
mod livestream;
mod naming;
mod session;
mod storage;

pub use adapter::{GcpAdapter, GcpState};
pub use auth::{CLOUD_PLATFORM_SCOPE, ServiceAccountAuth, ServiceAccountKey};
pub use builder::{build_channel, build_input};
pub use config::{GcpCredentials, GcpInputType, GcpOptions};
pub use livestream::{
    CHANNEL_TYPE_URL, ChannelOutput, INPUT_TYPE_URL, InputEndpoint, LiveChannel, LiveStreamApi,
    LiveStreamClient, Operation, OperationStatus,
};
pub use naming::{DEFAULT_NAME_PREFIX, DEFAULT_NAME_WORDS, generate_dns_compliant_name};
pub use session::GcpSession;
pub use storage::{Bucket, StorageApi, StorageClient};

/// Tracing target for GCP operations.
pub const TRACING_TARGET: &str = "sendlive::gcp";
