//! Authenticated GCP service clients.

use std::sync::{Arc, OnceLock};

use super::{
    GcpCredentials, LiveStreamApi, LiveStreamClient, ServiceAccountAuth, StorageApi,
    StorageClient,
};
use crate::error::{Error, Result};
use crate::http::{HttpConfig, RestClient};

/// Lazily creates and then reuses the Cloud Storage and Live Stream clients.
///
/// Both clients share one service account token provider.
pub struct GcpSession {
    credentials: GcpCredentials,
    http: RestClient,
    auth: Option<Arc<ServiceAccountAuth>>,
    storage: OnceLock<Arc<dyn StorageApi>>,
    livestream: OnceLock<Arc<dyn LiveStreamApi>>,
}

impl std::fmt::Debug for GcpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSession")
            .field("project_id", &self.credentials.project_id)
            .field("region", &self.credentials.region)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl GcpSession {
    /// Creates a session. The service account key is parsed here, but no
    /// token is requested until the first vendor call.
    pub fn new(credentials: GcpCredentials, http: HttpConfig) -> Result<Self> {
        let http = RestClient::new(http)?;
        let auth = ServiceAccountAuth::new(&credentials.service_account_json)?;

        Ok(Self {
            credentials,
            http,
            auth: Some(Arc::new(auth)),
            storage: OnceLock::new(),
            livestream: OnceLock::new(),
        })
    }

    /// Creates a session around existing clients.
    pub fn from_clients(
        credentials: GcpCredentials,
        storage: Arc<dyn StorageApi>,
        livestream: Arc<dyn LiveStreamApi>,
    ) -> Result<Self> {
        let session = Self {
            credentials,
            http: RestClient::new(HttpConfig::default())?,
            auth: None,
            storage: OnceLock::new(),
            livestream: OnceLock::new(),
        };
        let _ = session.storage.set(storage);
        let _ = session.livestream.set(livestream);
        Ok(session)
    }

    /// Credentials the session was built from.
    pub fn credentials(&self) -> &GcpCredentials {
        &self.credentials
    }

    fn auth(&self) -> Result<Arc<ServiceAccountAuth>> {
        self.auth
            .clone()
            .ok_or_else(|| Error::configuration("GCP session has no service account"))
    }

    /// Cloud Storage client, created on first use.
    pub fn storage(&self) -> Result<Arc<dyn StorageApi>> {
        if let Some(client) = self.storage.get() {
            return Ok(client.clone());
        }

        let client: Arc<dyn StorageApi> =
            Arc::new(StorageClient::new(self.http.clone(), self.auth()?)?);
        Ok(self.storage.get_or_init(|| client).clone())
    }

    /// Live Stream API client, created on first use.
    pub fn livestream(&self) -> Result<Arc<dyn LiveStreamApi>> {
        if let Some(client) = self.livestream.get() {
            return Ok(client.clone());
        }

        let client: Arc<dyn LiveStreamApi> =
            Arc::new(LiveStreamClient::new(self.http.clone(), self.auth()?)?);
        Ok(self.livestream.get_or_init(|| client).clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn credentials() -> GcpCredentials {
        let key = json!({
            "type": "service_account",
            "client_email": "sendlive@project.iam.gserviceaccount.com",
            "private_key": include_str!("../../fixtures/service_account_key.pem"),
            "token_uri": "https://oauth2.googleapis.com/token",
        });
        GcpCredentials::new("project", key.to_string(), "us-central1")
    }

    #[test]
    fn test_clients_are_reused() {
        let session = GcpSession::new(credentials(), HttpConfig::default()).unwrap();

        let first = session.storage().unwrap();
        let second = session.storage().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let first = session.livestream().unwrap();
        let second = session.livestream().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_malformed_key_fails_before_any_call() {
        let credentials = GcpCredentials::new("project", "{}", "us-central1");
        let error = GcpSession::new(credentials, HttpConfig::default()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }
}
