//! Provider identity and credential types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::aws::AwsCredentials;
use crate::error::{Error, Result};
use crate::gcp::GcpCredentials;

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
pub enum ServiceProvider {
    /// AWS MediaLive and MediaPackage v2.
    #[strum(to_string = "aws_medialive", serialize = "aws")]
    Aws,
    /// GCP Live Stream API and Cloud Storage.
    #[strum(to_string = "gcp")]
    Gcp,
}

impl Serialize for ServiceProvider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for ServiceProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).map_err(serde::de::Error::custom)
    }
}

/// A secret string that never renders its value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    ///
    /// Callers must not log the returned string.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

/// Credentials for one of the supported providers.
///
/// The provider identity is the variant itself, so it can never disagree
/// with the credential fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum Credentials {
    /// AWS access keys.
    #[serde(rename = "aws_medialive", alias = "aws")]
    Aws(AwsCredentials),
    /// GCP service account.
    #[serde(rename = "gcp")]
    Gcp(GcpCredentials),
}

impl Credentials {
    /// Returns the provider these credentials belong to.
    pub fn service_provider(&self) -> ServiceProvider {
        match self {
            Self::Aws(_) => ServiceProvider::Aws,
            Self::Gcp(_) => ServiceProvider::Gcp,
        }
    }

    /// Parses provider-tagged credentials from a JSON document.
    ///
    /// The `provider` field is checked first so that an unknown provider is
    /// reported as [`ErrorKind::UnsupportedProvider`] rather than as a
    /// malformed document.
    ///
    /// [`ErrorKind::UnsupportedProvider`]: crate::ErrorKind::UnsupportedProvider
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let provider = value
            .get("provider")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::configuration("credentials are missing a provider field"))?;

        ServiceProvider::from_str(&provider).map_err(|_| Error::unsupported_provider(&provider))?;

        serde_json::from_value(value).map_err(|e| {
            Error::configuration(format!("malformed {provider} credentials")).with_source(e)
        })
    }
}

impl From<AwsCredentials> for Credentials {
    fn from(credentials: AwsCredentials) -> Self {
        Self::Aws(credentials)
    }
}

impl From<GcpCredentials> for Credentials {
    fn from(credentials: GcpCredentials) -> Self {
        Self::Gcp(credentials)
    }
}
