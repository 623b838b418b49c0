//! Structured error handling for provisioning operations.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while provisioning a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed local configuration, detected before any vendor call.
    Configuration,
    /// A vendor call returned an unexpected status or payload.
    Provider,
    /// A vendor rejected the supplied credentials.
    ProviderPermission,
    /// A long-running vendor operation did not finish in time.
    ///
    /// The remote resource may still materialize after this is returned.
    OperationTimeout,
    /// The vendor reported that the resource already exists.
    AlreadyExists,
    /// The credentials declare a provider with no registered adapter.
    UnsupportedProvider,
    /// A recognized but intentionally unsupported combination of arguments.
    UnimplementedOperation,
    /// Local (de)serialization failed.
    Serialization,
}

impl ErrorKind {
    /// Whether this kind originates from a vendor interaction.
    #[must_use]
    pub const fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::Provider | Self::ProviderPermission | Self::OperationTimeout | Self::AlreadyExists
        )
    }
}

/// Structured error type carrying the raw vendor response for diagnosis.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// Raw vendor response, when one was received.
    pub response: Option<serde_json::Value>,
    /// Long-running operation name, when the failure relates to one.
    pub operation: Option<String>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            response: None,
            operation: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self::new(kind).with_source(source)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }

    /// Creates a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Provider).with_message(message)
    }

    /// Creates a provider permission error.
    pub fn provider_permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderPermission).with_message(message)
    }

    /// Creates an operation timeout error for the named operation.
    pub fn operation_timeout(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(ErrorKind::OperationTimeout)
            .with_message(format!("timed out waiting for operation {operation}"))
            .with_operation(operation)
    }

    /// Creates an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists).with_message(message)
    }

    /// Creates an unsupported provider error.
    pub fn unsupported_provider(provider: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::UnsupportedProvider)
            .with_message(format!("provider {provider} is not supported"))
    }

    /// Creates an unimplemented operation error.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnimplementedOperation).with_message(message)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the raw vendor response.
    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Attaches the long-running operation name.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether this error originates from a vendor interaction.
    #[must_use]
    pub const fn is_provider_error(&self) -> bool {
        self.kind.is_provider_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("invalid JSON document")
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request to provider timed out".to_string()
        } else if error.is_connect() {
            "connection to provider failed".to_string()
        } else {
            error.to_string()
        };

        Self::from_source(ErrorKind::Provider, error).with_message(message)
    }
}
