//! Reqwest-based HTTP client shared by the vendor clients.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{ApiResponse, HttpConfig, TRACING_TARGET};
use crate::error::{Error, Result};

/// A request before it is handed to reqwest.
///
/// Vendor clients build one of these, optionally sign it, and pass it to
/// [`RestClient::send`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Vendor service label used in logs and error messages.
    pub service: &'static str,
    /// HTTP method.
    pub method: Method,
    /// Fully-qualified request URL.
    pub url: Url,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// JSON-encoded body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request without a body.
    pub fn new(service: &'static str, method: Method, url: Url) -> Self {
        Self {
            service,
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets a JSON body.
    pub fn with_json(mut self, body: &impl Serialize) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Body bytes, empty when there is no body.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Inner client that holds the HTTP client and configuration.
struct RestClientInner {
    http: Client,
    config: HttpConfig,
}

/// Cloneable HTTP client for vendor REST APIs.
///
/// Authentication and authorization failures (401/403) become
/// [`ErrorKind::ProviderPermission`] and conflicts (409) become
/// [`ErrorKind::AlreadyExists`]. Every other status is returned to the caller,
/// which decides what counts as success.
///
/// [`ErrorKind::ProviderPermission`]: crate::ErrorKind::ProviderPermission
/// [`ErrorKind::AlreadyExists`]: crate::ErrorKind::AlreadyExists
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let timeout = config.request_timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            user_agent = config.user_agent_or_default(),
            "Creating HTTP client"
        );

        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent_or_default());
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::configuration("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            inner: Arc::new(RestClientInner { http, config }),
        })
    }

    /// Gets the underlying reqwest client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
        tracing::debug!(
            target: TRACING_TARGET,
            service = request.service,
            method = %request.method,
            url = %request.url,
            "Sending vendor request"
        );

        let mut builder = self
            .http()
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let http_response = builder.send().await?;
        let status = http_response.status();
        let text = http_response.text().await?;

        let response = ApiResponse::new(status.as_u16(), decode_body(text));

        tracing::debug!(
            target: TRACING_TARGET,
            service = request.service,
            status = response.status,
            "Vendor request completed"
        );

        classify(request.service, status, response)
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn classify(service: &str, status: StatusCode, response: ApiResponse) -> Result<ApiResponse> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::provider_permission(
            format!("{service} rejected the credentials (HTTP {})", status.as_u16()),
        )
        .with_response(response.to_diagnostic())),
        StatusCode::CONFLICT => Err(Error::already_exists(format!(
            "{service} reported that the resource already exists"
        ))
        .with_response(response.to_diagnostic())),
        _ => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_client_creation() {
        let config = HttpConfig::default().with_connect_timeout(Duration::from_secs(5));
        let client = RestClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body("{\"a\":1}".to_string()), json!({ "a": 1 }));
        assert_eq!(decode_body("oops".to_string()), json!("oops"));
    }

    #[test]
    fn test_classify_permission() {
        let response = ApiResponse::new(403, json!({ "message": "denied" }));
        let error = classify("medialive", StatusCode::FORBIDDEN, response).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ProviderPermission);
        assert!(error.is_provider_error());
    }

    #[test]
    fn test_classify_conflict() {
        let response = ApiResponse::new(409, Value::Null);
        let error = classify("livestream", StatusCode::CONFLICT, response).unwrap_err();
        assert_eq!(error.kind, ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_classify_separates_permission_from_outage() {
        let response = ApiResponse::new(401, Value::Null);
        let error = classify("storage", StatusCode::UNAUTHORIZED, response).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ProviderPermission);

        let response = ApiResponse::new(503, json!({ "error": "backendError" }));
        let error = classify("storage", StatusCode::SERVICE_UNAVAILABLE, response)
            .unwrap()
            .ensure_success("list buckets")
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Provider);
    }

    #[test]
    fn test_classify_passes_other_statuses() {
        let response = ApiResponse::new(500, Value::Null);
        let response = classify("medialive", StatusCode::INTERNAL_SERVER_ERROR, response).unwrap();
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_request_with_json() {
        let url = Url::parse("https://example.com/inputs").unwrap();
        let request = HttpRequest::new("medialive", Method::POST, url)
            .with_json(&json!({ "name": "my_stream" }))
            .unwrap();

        assert_eq!(request.body_bytes(), br#"{"name":"my_stream"}"#);
        assert!(
            request
                .headers
                .iter()
                .any(|(k, v)| k == "content-type" && v == "application/json")
        );
    }
}
