//! The provisioned stream handle.

use serde::{Deserialize, Serialize};

use crate::credentials::ServiceProvider;

/// One provisioned live input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Caller-chosen name, also the vendor resource identifier.
    pub name: String,
    /// Provider the stream lives on.
    pub provider: ServiceProvider,
    /// Ingest URL, set once the input exists.
    pub endpoint: Option<String>,
}

impl Stream {
    /// Creates a stream without an endpoint.
    pub fn new(name: impl Into<String>, provider: ServiceProvider) -> Self {
        Self {
            name: name.into(),
            provider,
            endpoint: None,
        }
    }

    /// Sets the ingest URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Whether the ingest URL is known.
    pub fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_is_ready_once_endpoint_is_set() {
        let stream = Stream::new("my_stream", ServiceProvider::Aws);
        assert!(!stream.is_ready());

        let stream = stream.with_endpoint("rtmp://203.0.113.10:1935/my_stream");
        assert!(stream.is_ready());
    }

    #[test]
    fn test_serialize_provider_identity() {
        let stream = Stream::new("my_stream", ServiceProvider::Gcp);
        let value = serde_json::to_value(&stream).unwrap();
        assert_eq!(value["provider"], "gcp");
        assert!(value["endpoint"].is_null());
    }
}
