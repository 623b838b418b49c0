//! Authenticated AWS service clients.

use std::sync::{Arc, OnceLock};

use super::{AwsCredentials, MediaLiveApi, MediaLiveClient, MediaPackageApi, MediaPackageClient};
use crate::error::Result;
use crate::http::{HttpConfig, RestClient};

/// Lazily creates and then reuses the MediaLive and MediaPackage clients.
///
/// Building a session makes no network call; bad keys only surface on the
/// first vendor request.
pub struct AwsSession {
    credentials: AwsCredentials,
    http: RestClient,
    medialive: OnceLock<Arc<dyn MediaLiveApi>>,
    mediapackage: OnceLock<Arc<dyn MediaPackageApi>>,
}

impl std::fmt::Debug for AwsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSession")
            .field("access_key", &self.credentials.access_key)
            .field("region", &self.credentials.region)
            .finish_non_exhaustive()
    }
}

impl AwsSession {
    /// Creates a session for the given credentials.
    pub fn new(credentials: AwsCredentials, http: HttpConfig) -> Result<Self> {
        Ok(Self {
            credentials,
            http: RestClient::new(http)?,
            medialive: OnceLock::new(),
            mediapackage: OnceLock::new(),
        })
    }

    /// Creates a session around existing clients.
    pub fn from_clients(
        credentials: AwsCredentials,
        medialive: Arc<dyn MediaLiveApi>,
        mediapackage: Arc<dyn MediaPackageApi>,
    ) -> Result<Self> {
        let session = Self::new(credentials, HttpConfig::default())?;
        let _ = session.medialive.set(medialive);
        let _ = session.mediapackage.set(mediapackage);
        Ok(session)
    }

    /// Region the session operates in.
    pub fn region(&self) -> &str {
        &self.credentials.region
    }

    /// MediaLive client, created on first use.
    pub fn medialive(&self) -> Result<Arc<dyn MediaLiveApi>> {
        if let Some(client) = self.medialive.get() {
            return Ok(client.clone());
        }

        let client: Arc<dyn MediaLiveApi> =
            Arc::new(MediaLiveClient::new(self.http.clone(), &self.credentials)?);
        Ok(self.medialive.get_or_init(|| client).clone())
    }

    /// MediaPackage v2 client, created on first use.
    pub fn mediapackage(&self) -> Result<Arc<dyn MediaPackageApi>> {
        if let Some(client) = self.mediapackage.get() {
            return Ok(client.clone());
        }

        let client: Arc<dyn MediaPackageApi> =
            Arc::new(MediaPackageClient::new(self.http.clone(), &self.credentials)?);
        Ok(self.mediapackage.get_or_init(|| client).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_reused() {
        let credentials = AwsCredentials::new("AKIA", "secret", "ap-southeast-2");
        let session = AwsSession::new(credentials, HttpConfig::default()).unwrap();

        let first = session.medialive().unwrap();
        let second = session.medialive().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let first = session.mediapackage().unwrap();
        let second = session.mediapackage().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_debug_hides_secret() {
        let credentials = AwsCredentials::new("AKIA", "very-secret", "ap-southeast-2");
        let session = AwsSession::new(credentials, HttpConfig::default()).unwrap();
        assert!(!format!("{session:?}").contains("very-secret"));
    }
}
