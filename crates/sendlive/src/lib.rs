#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod credentials;
mod error;
mod facade;
mod options;
mod poll;
mod stream;

pub mod aws;
pub mod gcp;
pub mod http;
pub mod tags;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use credentials::{Credentials, Secret, ServiceProvider};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use facade::{Adapter, SendLive, create_stream};
pub use options::ProviderOptions;
pub use poll::{DEFAULT_POLL_INTERVAL, PollPolicy, poll_until};
pub use stream::Stream;
pub use tags::Tags;

/// Tracing target for the provider-agnostic facade.
pub const TRACING_TARGET: &str = "sendlive";
