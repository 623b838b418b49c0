//! AWS credentials and provisioning options.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::credentials::Secret;
use crate::http::HttpConfig;

/// AWS access keys for MediaLive and MediaPackage v2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsCredentials {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: Secret,
    /// Region, e.g. `ap-southeast-2`.
    pub region: String,
}

impl AwsCredentials {
    /// Creates AWS credentials.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<Secret>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }
}

/// MediaLive push input types.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwsInputType {
    /// RTMP push ingest.
    #[default]
    RtmpPush,
    /// RTP push ingest.
    RtpPush,
    /// UDP push ingest.
    UdpPush,
}

/// Options for the AWS adapter.
///
/// The defaults auto-provision everything: a fresh input security group and
/// an RTMP push input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsOptions {
    /// Existing input security group to reuse instead of creating one.
    #[serde(default)]
    pub input_security_group_id: Option<String>,
    /// Input type to create.
    #[serde(default)]
    pub input_type: AwsInputType,
    /// IAM role MediaLive assumes when running encoder channels.
    #[serde(default)]
    pub channel_role_arn: Option<String>,
    /// HTTP client configuration.
    #[serde(default)]
    pub http: HttpConfig,
}

impl AwsOptions {
    /// Reuses an existing input security group.
    #[must_use]
    pub fn with_input_security_group_id(mut self, id: impl Into<String>) -> Self {
        self.input_security_group_id = Some(id.into());
        self
    }

    /// Sets the input type.
    #[must_use]
    pub fn with_input_type(mut self, input_type: AwsInputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Sets the IAM role for encoder channels.
    #[must_use]
    pub fn with_channel_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.channel_role_arn = Some(arn.into());
        self
    }

    /// Sets the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_options_default_to_auto_provisioning() {
        let options = AwsOptions::default();
        assert!(options.input_security_group_id.is_none());
        assert_eq!(options.input_type, AwsInputType::RtmpPush);
        assert_eq!(options.input_type.as_ref(), "RTMP_PUSH");
    }

    #[test]
    fn test_options_deserialize() {
        let options: AwsOptions = serde_json::from_value(json!({
            "input_security_group_id": "123456",
            "input_type": "UDP_PUSH",
        }))
        .unwrap();

        assert_eq!(options.input_security_group_id.as_deref(), Some("123456"));
        assert_eq!(options.input_type, AwsInputType::UdpPush);
    }
}
