//! Raw vendor responses.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{Error, Result};

/// A vendor response: HTTP status plus the decoded JSON body.
///
/// The body is kept as raw JSON so it can be embedded in errors and logs
/// exactly as the vendor returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, `Null` when empty.
    pub body: Value,
}

impl ApiResponse {
    /// Creates a response from a status and body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Creates a `201 Created` response.
    pub fn created(body: Value) -> Self {
        Self::new(StatusCode::CREATED.as_u16(), body)
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK.as_u16(), body)
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is `201 Created`.
    pub fn is_created(&self) -> bool {
        self.status == StatusCode::CREATED.as_u16()
    }

    /// Status and body as one JSON value, for diagnostics.
    pub fn to_diagnostic(&self) -> Value {
        json!({ "status": self.status, "body": self.body })
    }

    /// Fails with a provider error unless the status is 2xx.
    pub fn ensure_success(self, context: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(
            Error::provider(format!("{context}: unexpected HTTP status {}", self.status))
                .with_response(self.to_diagnostic()),
        )
    }

    /// Decodes the body into a typed value.
    ///
    /// A body that does not match the expected shape is a provider error,
    /// with the raw response attached.
    pub fn parse<T: DeserializeOwned>(&self, context: &str) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            Error::provider(format!("{context}: unexpected response body"))
                .with_response(self.to_diagnostic())
                .with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::ErrorKind;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_status_helpers() {
        assert!(ApiResponse::created(Value::Null).is_created());
        assert!(ApiResponse::ok(Value::Null).is_success());
        assert!(!ApiResponse::ok(Value::Null).is_created());
        assert!(!ApiResponse::new(500, Value::Null).is_success());
    }

    #[test]
    fn test_ensure_success() {
        let error = ApiResponse::new(500, json!({ "message": "boom" }))
            .ensure_success("create input")
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Provider);
        assert_eq!(error.response.unwrap()["body"]["message"], "boom");
    }

    #[test]
    fn test_parse() {
        let response = ApiResponse::ok(json!({ "name": "bucket" }));
        let named: Named = response.parse("get bucket").unwrap();
        assert_eq!(named.name, "bucket");

        let error = ApiResponse::ok(json!({ "other": 1 }))
            .parse::<Named>("get bucket")
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Provider);
        assert!(error.response.is_some());
    }
}
