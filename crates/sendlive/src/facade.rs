//! Provider-agnostic entry point.

use crate::TRACING_TARGET;
use crate::aws::AwsAdapter;
use crate::credentials::{Credentials, ServiceProvider};
use crate::error::{Error, Result};
use crate::gcp::GcpAdapter;
use crate::options::ProviderOptions;
use crate::stream::Stream;
use crate::tags::Tags;

/// Provisions a stream named `name` with whichever provider `credentials`
/// belong to.
///
/// `options` must be for the same provider, otherwise this fails with
/// [`ErrorKind::Configuration`] before any vendor call.
///
/// [`ErrorKind::Configuration`]: crate::ErrorKind::Configuration
pub async fn create_stream(
    credentials: Credentials,
    name: &str,
    options: Option<ProviderOptions>,
) -> Result<Stream> {
    SendLive::connect(credentials, options)?
        .create_stream(name, None)
        .await
}

/// A provider adapter selected by credential variant.
#[derive(Debug)]
pub enum Adapter {
    Aws(AwsAdapter),
    Gcp(GcpAdapter),
}

impl Adapter {
    /// Selects the adapter for `credentials`.
    pub fn new(credentials: Credentials, options: Option<ProviderOptions>) -> Result<Self> {
        let provider = credentials.service_provider();

        match (credentials, options) {
            (Credentials::Aws(credentials), None) => {
                Ok(Self::Aws(AwsAdapter::new(credentials, None)))
            }
            (Credentials::Aws(credentials), Some(ProviderOptions::Aws(options))) => {
                Ok(Self::Aws(AwsAdapter::new(credentials, Some(options))))
            }
            (Credentials::Gcp(credentials), None) => {
                Ok(Self::Gcp(GcpAdapter::new(credentials, None)))
            }
            (Credentials::Gcp(credentials), Some(ProviderOptions::Gcp(options))) => {
                Ok(Self::Gcp(GcpAdapter::new(credentials, Some(options))))
            }
            (_, Some(options)) => Err(Error::configuration(format!(
                "{} options given for {provider} credentials",
                options.service_provider()
            ))),
        }
    }

    /// Provider this adapter talks to.
    pub fn service_provider(&self) -> ServiceProvider {
        match self {
            Self::Aws(_) => ServiceProvider::Aws,
            Self::Gcp(_) => ServiceProvider::Gcp,
        }
    }

    /// Builds the adapter's session.
    pub fn connect(&mut self) -> Result<()> {
        match self {
            Self::Aws(adapter) => adapter.connect(),
            Self::Gcp(adapter) => adapter.connect(),
        }
    }

    /// Provisions a stream with the adapter's defaults.
    pub async fn create_stream(&mut self, name: &str, tags: Option<&Tags>) -> Result<Stream> {
        match self {
            Self::Aws(adapter) => adapter.create_stream(name, None, tags).await,
            Self::Gcp(adapter) => adapter.create_stream(name, tags).await,
        }
    }
}

impl From<AwsAdapter> for Adapter {
    fn from(adapter: AwsAdapter) -> Self {
        Self::Aws(adapter)
    }
}

impl From<GcpAdapter> for Adapter {
    fn from(adapter: GcpAdapter) -> Self {
        Self::Gcp(adapter)
    }
}

/// A connected adapter kept across calls.
///
/// Vendor clients and per-adapter caches (AWS channel groups, GCP bucket and
/// inputs) live as long as this value.
#[derive(Debug)]
pub struct SendLive {
    adapter: Adapter,
    tags: Option<Tags>,
}

impl SendLive {
    /// Selects and connects the adapter for `credentials`.
    pub fn connect(credentials: Credentials, options: Option<ProviderOptions>) -> Result<Self> {
        let mut adapter = Adapter::new(credentials, options)?;
        adapter.connect()?;

        tracing::debug!(
            target: TRACING_TARGET,
            provider = %adapter.service_provider(),
            "Adapter connected"
        );

        Ok(Self::from_adapter(adapter))
    }

    /// Wraps an already connected adapter.
    pub fn from_adapter(adapter: impl Into<Adapter>) -> Self {
        Self {
            adapter: adapter.into(),
            tags: None,
        }
    }

    /// Tags applied to every stream created through this value.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// The underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// The underlying adapter, for provider-specific steps.
    pub fn adapter_mut(&mut self) -> &mut Adapter {
        &mut self.adapter
    }

    /// Provisions a stream named `name`.
    ///
    /// `tags` are used instead of the tags set with [`SendLive::with_tags`]
    /// when given.
    pub async fn create_stream(&mut self, name: &str, tags: Option<&Tags>) -> Result<Stream> {
        let tags = tags.or(self.tags.as_ref());
        let stream = self.adapter.create_stream(name, tags).await?;

        tracing::info!(
            target: TRACING_TARGET,
            stream = %stream.name,
            provider = %stream.provider,
            endpoint = ?stream.endpoint,
            "Stream created"
        );

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::ErrorKind;
    use crate::aws::AwsOptions;
    use crate::gcp::GcpOptions;
    use crate::mock::{
        CallLog, MockLiveStream, MockMediaLive, MockMediaPackage, MockStorage, aws_adapter,
        aws_credentials, gcp_adapter, gcp_credentials,
    };

    #[tokio::test]
    async fn test_unsupported_provider() {
        let error = Credentials::from_json(json!({
            "provider": "azure_media_services",
            "client_id": "id",
        }))
        .unwrap_err();

        assert_eq!(error.kind, ErrorKind::UnsupportedProvider);
    }

    #[tokio::test]
    async fn test_mismatched_options() {
        let error = create_stream(
            aws_credentials().into(),
            "my-stream",
            Some(GcpOptions::default().into()),
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let error = Adapter::new(
            gcp_credentials().into(),
            Some(AwsOptions::default().into()),
        )
        .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_invalid_service_account_fails_on_connect() {
        let error = create_stream(gcp_credentials().into(), "my-stream", None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_adapter_selected_by_credentials() {
        let adapter = Adapter::new(aws_credentials().into(), None).unwrap();
        assert_eq!(adapter.service_provider(), ServiceProvider::Aws);

        let adapter = Adapter::new(gcp_credentials().into(), None).unwrap();
        assert_eq!(adapter.service_provider(), ServiceProvider::Gcp);
    }

    #[tokio::test]
    async fn test_aws_stream_through_facade() {
        let log = CallLog::default();
        let adapter = aws_adapter(
            Arc::new(MockMediaLive::new(log.clone())),
            Arc::new(MockMediaPackage::new(log.clone())),
            None,
        )
        .unwrap();

        let mut sendlive = SendLive::from_adapter(adapter);
        let stream = sendlive.create_stream("my-stream", None).await.unwrap();

        assert_eq!(stream.provider, ServiceProvider::Aws);
        assert_eq!(
            stream.endpoint.as_deref(),
            Some(MockMediaLive::endpoint_for("my-stream").as_str())
        );
        assert_eq!(
            log.calls(),
            ["medialive.create_input_security_group", "medialive.create_input"]
        );
    }

    #[tokio::test]
    async fn test_gcp_stream_uses_default_tags() {
        let log = CallLog::default();
        let adapter = gcp_adapter(
            Arc::new(MockStorage::new(log.clone())),
            Arc::new(MockLiveStream::new(log.clone())),
            None,
        )
        .unwrap();

        let tags = Tags::from([("Team".to_string(), "Video".to_string())]);
        let mut sendlive = SendLive::from_adapter(adapter).with_tags(tags);
        let stream = sendlive.create_stream("my-stream", None).await.unwrap();

        assert_eq!(
            stream.endpoint.as_deref(),
            Some(MockLiveStream::uri_for("my-stream").as_str())
        );
        let Adapter::Gcp(adapter) = sendlive.adapter() else {
            panic!("expected GCP adapter");
        };
        assert_eq!(adapter.inputs()[0].labels["team"], "Video");
    }
}
