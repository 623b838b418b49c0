//! Provider-specific provisioning options.

use serde::{Deserialize, Serialize};

use crate::aws::AwsOptions;
use crate::credentials::ServiceProvider;
use crate::gcp::GcpOptions;

/// Options for one provider.
///
/// Serialized with a `provider` tag matching [`Credentials`], so a single
/// JSON document can carry either variant.
///
/// [`Credentials`]: crate::Credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ProviderOptions {
    /// MediaLive and MediaPackage v2 options.
    #[serde(rename = "aws_medialive", alias = "aws")]
    Aws(AwsOptions),
    /// Live Stream API and Cloud Storage options.
    #[serde(rename = "gcp")]
    Gcp(GcpOptions),
}

impl ProviderOptions {
    /// Provider these options apply to.
    pub fn service_provider(&self) -> ServiceProvider {
        match self {
            Self::Aws(_) => ServiceProvider::Aws,
            Self::Gcp(_) => ServiceProvider::Gcp,
        }
    }
}

impl From<AwsOptions> for ProviderOptions {
    fn from(options: AwsOptions) -> Self {
        Self::Aws(options)
    }
}

impl From<GcpOptions> for ProviderOptions {
    fn from(options: GcpOptions) -> Self {
        Self::Gcp(options)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_tagged_options() {
        let options: ProviderOptions = serde_json::from_value(json!({
            "provider": "gcp",
            "bucket_name": "my-bucket",
            "auto_create_bucket": false,
        }))
        .unwrap();

        let ProviderOptions::Gcp(options) = options else {
            panic!("expected GCP options");
        };
        assert_eq!(options.bucket_name.as_deref(), Some("my-bucket"));
        assert!(!options.auto_create_bucket);
        assert!(options.reuse_existing_input);
    }

    #[test]
    fn test_aws_alias() {
        let options: ProviderOptions =
            serde_json::from_value(json!({ "provider": "aws" })).unwrap();
        assert_eq!(options.service_provider(), ServiceProvider::Aws);
        assert_eq!(options, ProviderOptions::Aws(AwsOptions::default()));
    }
}
