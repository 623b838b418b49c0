//! Service account access tokens.

use std::sync::Arc;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;

use super::TRACING_TARGET;
use crate::credentials::Secret;
use crate::error::{Error, Result};

/// OAuth2 scope granting access to all Cloud APIs.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// The fields of a service account key file this crate reads itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    /// Parses a key file.
    pub fn from_json(json: &Secret) -> Result<Self> {
        serde_json::from_str(json.expose()).map_err(|e| {
            Error::configuration("service account JSON is malformed").with_source(e)
        })
    }
}

/// Access tokens for one service account.
///
/// Token exchange and caching are done by a [`TokenProvider`], by default
/// `gcp_auth`'s [`CustomServiceAccount`].
pub struct ServiceAccountAuth {
    client_email: String,
    provider: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Parses the key file and its private key. No network call is made.
    pub fn new(service_account_json: &Secret) -> Result<Self> {
        let key = ServiceAccountKey::from_json(service_account_json)?;
        let provider = CustomServiceAccount::from_json(service_account_json.expose())
            .map_err(|e| {
                Error::configuration(format!(
                    "service account key for {} is not usable",
                    key.client_email
                ))
                .with_source(e)
            })?;

        Ok(Self::with_provider(key.client_email, Arc::new(provider)))
    }

    /// Wraps an existing token provider.
    pub fn with_provider(client_email: impl Into<String>, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client_email: client_email.into(),
            provider,
        }
    }

    /// Service account email.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Returns a valid access token for [`CLOUD_PLATFORM_SCOPE`].
    ///
    /// A token that cannot be obtained is a [`ErrorKind::Provider`] error.
    /// Rejected credentials show up on the API call itself as
    /// [`ErrorKind::ProviderPermission`].
    ///
    /// [`ErrorKind::Provider`]: crate::ErrorKind::Provider
    /// [`ErrorKind::ProviderPermission`]: crate::ErrorKind::ProviderPermission
    pub async fn access_token(&self) -> Result<Secret> {
        let token = self
            .provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    client_email = %self.client_email,
                    error = %e,
                    "Access token request failed"
                );
                Error::provider(format!(
                    "could not obtain an access token for {}",
                    self.client_email
                ))
                .with_source(e)
            })?;

        Ok(Secret::new(token.as_str()))
    }
}
