//! GCP credentials and provisioning options.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::credentials::Secret;
use crate::http::HttpConfig;
use crate::poll::PollPolicy;

/// GCP service account credentials for the Live Stream API and Cloud
/// Storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpCredentials {
    /// Project that owns the resources.
    pub project_id: String,
    /// Service account key file contents (JSON).
    pub service_account_json: Secret,
    /// Live Stream API location, e.g. `us-central1`.
    pub region: String,
}

impl GcpCredentials {
    /// Creates GCP credentials.
    pub fn new(
        project_id: impl Into<String>,
        service_account_json: impl Into<Secret>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            service_account_json: service_account_json.into(),
            region: region.into(),
        }
    }

    /// `projects/{project}/locations/{region}`.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.region)
    }
}

/// Live Stream API input types.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GcpInputType {
    /// RTMP push ingest.
    #[default]
    RtmpPush,
    /// SRT push ingest.
    SrtPush,
}

/// Options for the GCP adapter.
///
/// The defaults reuse or create a provenance-labelled bucket and reuse an
/// input that already exists under the requested id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpOptions {
    /// Bucket to write channel output to instead of discovering one.
    pub bucket_name: Option<String>,
    /// Create a bucket when none is named or found.
    pub auto_create_bucket: bool,
    /// Fetch and reuse an input when creation reports it already exists.
    pub reuse_existing_input: bool,
    /// Input type to create.
    pub input_type: GcpInputType,
    /// Location of created buckets.
    pub bucket_location: String,
    /// Storage class of created buckets.
    pub storage_class: String,
    /// Deadline for input creation, in seconds.
    pub input_timeout_secs: u64,
    /// Deadline for channel creation, in seconds.
    pub channel_timeout_secs: u64,
    /// Delay between operation polls, in seconds.
    pub poll_interval_secs: u64,
    /// HTTP client configuration.
    pub http: HttpConfig,
}

impl Default for GcpOptions {
    fn default() -> Self {
        Self {
            bucket_name: None,
            auto_create_bucket: true,
            reuse_existing_input: true,
            input_type: GcpInputType::RtmpPush,
            bucket_location: "us".to_string(),
            storage_class: "STANDARD".to_string(),
            input_timeout_secs: 900,
            channel_timeout_secs: 600,
            poll_interval_secs: 5,
            http: HttpConfig::default(),
        }
    }
}

impl GcpOptions {
    /// Writes output to an existing bucket.
    #[must_use]
    pub fn with_bucket_name(mut self, bucket_name: impl Into<String>) -> Self {
        self.bucket_name = Some(bucket_name.into());
        self
    }

    /// Enables or disables bucket creation.
    #[must_use]
    pub fn with_auto_create_bucket(mut self, enabled: bool) -> Self {
        self.auto_create_bucket = enabled;
        self
    }

    /// Enables or disables reuse of existing inputs.
    #[must_use]
    pub fn with_reuse_existing_input(mut self, enabled: bool) -> Self {
        self.reuse_existing_input = enabled;
        self
    }

    /// Sets the input type.
    #[must_use]
    pub fn with_input_type(mut self, input_type: GcpInputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Sets the input and channel deadlines.
    #[must_use]
    pub fn with_timeouts(mut self, input: Duration, channel: Duration) -> Self {
        self.input_timeout_secs = input.as_secs();
        self.channel_timeout_secs = channel.as_secs();
        self
    }

    /// Sets the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Polling policy for input creation.
    pub fn input_poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.input_timeout_secs)).with_interval(self.interval())
    }

    /// Polling policy for channel creation.
    pub fn channel_poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.channel_timeout_secs))
            .with_interval(self.interval())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = GcpOptions::default();
        assert!(options.auto_create_bucket);
        assert!(options.reuse_existing_input);
        assert_eq!(options.input_poll_policy().timeout, Duration::from_secs(900));
        assert_eq!(options.channel_poll_policy().timeout, Duration::from_secs(600));
        assert_eq!(options.input_type.as_ref(), "RTMP_PUSH");
    }

    #[test]
    fn test_partial_deserialize() {
        let options: GcpOptions = serde_json::from_value(json!({
            "bucket_name": "my-bucket",
            "reuse_existing_input": false,
        }))
        .unwrap();

        assert_eq!(options.bucket_name.as_deref(), Some("my-bucket"));
        assert!(!options.reuse_existing_input);
        assert!(options.auto_create_bucket);
        assert_eq!(options.bucket_location, "us");
    }

    #[test]
    fn test_parent() {
        let credentials = GcpCredentials::new("project", "{}", "us-central1");
        assert_eq!(credentials.parent(), "projects/project/locations/us-central1");
    }
}
