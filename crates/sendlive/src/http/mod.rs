//! HTTP plumbing shared by the vendor REST clients.

mod client;
mod config;
mod response;

pub use client::{HttpRequest, RestClient};
pub use config::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpConfig};
pub use response::ApiResponse;

/// Tracing target for HTTP operations.
pub const TRACING_TARGET: &str = "sendlive::http";
