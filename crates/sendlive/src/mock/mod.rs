//! Recording mock vendor clients for testing.
//!
//! The mocks answer like the real services would, record every call in a
//! shared [`CallLog`], and can be told to return canned responses instead.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! sendlive = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use sendlive::mock::{CallLog, MockLiveStream, MockStorage, gcp_adapter};
//!
//! let log = CallLog::default();
//! let mut adapter = gcp_adapter(
//!     Arc::new(MockStorage::new(log.clone())),
//!     Arc::new(MockLiveStream::new(log.clone()).with_pending_polls(2)),
//!     None,
//! )?;
//!
//! let stream = adapter.create_stream("my-stream", None).await?;
//! assert_eq!(log.count("storage.create_bucket"), 1);
//! ```

mod aws;
mod gcp;

use std::sync::{Arc, Mutex, PoisonError};

pub use aws::{MockMediaLive, MockMediaPackage, aws_adapter, aws_credentials};
pub use gcp::{MockLiveStream, MockStorage, gcp_adapter, gcp_credentials};

/// Ordered record of vendor calls, shared between mocks.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Records a call.
    pub fn record(&self, call: impl Into<String>) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.into());
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls to the given operation.
    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| *call == operation).count()
    }

    /// Whether no call was recorded.
    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
