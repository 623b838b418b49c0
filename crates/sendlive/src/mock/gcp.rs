use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{CallLog, lock};
use crate::error::{Error, Result};
use crate::gcp::{
    Bucket, CHANNEL_TYPE_URL, GcpAdapter, GcpCredentials, GcpOptions, GcpSession, INPUT_TYPE_URL,
    InputEndpoint, LiveStreamApi, Operation, StorageApi,
};
use crate::http::ApiResponse;
use crate::tags::Tags;

/// Mock Cloud Storage service.
///
/// Holds an in-memory bucket list; created buckets start without labels.
#[derive(Debug, Default)]
pub struct MockStorage {
    log: CallLog,
    buckets: Mutex<Vec<Bucket>>,
}

impl MockStorage {
    /// Creates a mock recording into `log`.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// A bucket with the given labels.
    pub fn bucket(name: &str, labels: &[(&str, &str)]) -> Bucket {
        Bucket {
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            location: Some("US".to_string()),
            storage_class: Some("STANDARD".to_string()),
        }
    }

    /// Adds an existing bucket.
    #[must_use]
    pub fn with_bucket(self, bucket: Bucket) -> Self {
        lock(&self.buckets).push(bucket);
        self
    }

    /// Buckets currently held.
    pub fn buckets(&self) -> Vec<Bucket> {
        lock(&self.buckets).clone()
    }
}

#[async_trait]
impl StorageApi for MockStorage {
    async fn list_buckets(&self, _project: &str) -> Result<Vec<Bucket>> {
        self.log.record("storage.list_buckets");
        Ok(self.buckets())
    }

    async fn get_bucket(&self, name: &str) -> Result<Bucket> {
        self.log.record("storage.get_bucket");
        self.buckets()
            .into_iter()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| Error::provider(format!("bucket {name} not found")))
    }

    async fn create_bucket(
        &self,
        _project: &str,
        name: &str,
        location: &str,
        storage_class: &str,
    ) -> Result<ApiResponse> {
        self.log.record("storage.create_bucket");

        let mut buckets = lock(&self.buckets);
        if buckets.iter().any(|bucket| bucket.name == name) {
            return Err(Error::already_exists(format!("bucket {name} already exists")));
        }

        let bucket = Bucket {
            name: name.to_string(),
            labels: Tags::new(),
            location: Some(location.to_uppercase()),
            storage_class: Some(storage_class.to_string()),
        };
        buckets.push(bucket.clone());
        Ok(ApiResponse::ok(bucket_resource(&bucket, 1)?))
    }

    async fn patch_bucket_labels(&self, name: &str, labels: &Tags) -> Result<ApiResponse> {
        self.log.record("storage.patch_bucket_labels");

        let mut buckets = lock(&self.buckets);
        let bucket = buckets
            .iter_mut()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| Error::provider(format!("bucket {name} not found")))?;
        bucket.labels.extend(labels.clone());
        Ok(ApiResponse::ok(bucket_resource(bucket, 2)?))
    }
}

/// Bucket resource as the JSON API returns it, with fields the typed
/// [`Bucket`] does not keep.
fn bucket_resource(bucket: &Bucket, metageneration: u32) -> Result<Value> {
    let mut resource = serde_json::to_value(bucket)?;
    if let Value::Object(fields) = &mut resource {
        fields.insert("kind".to_string(), json!("storage#bucket"));
        fields.insert("metageneration".to_string(), json!(metageneration.to_string()));
    }
    Ok(resource)
}

#[derive(Debug)]
struct PendingOperation {
    remaining: u32,
    response: Value,
}

/// Mock Live Stream API service.
///
/// Creation returns a long-running operation that completes after a
/// configurable number of polls. Creating an input that already exists
/// fails with [`ErrorKind::AlreadyExists`](crate::ErrorKind::AlreadyExists).
#[derive(Debug, Default)]
pub struct MockLiveStream {
    log: CallLog,
    pending_polls: u32,
    next_operation: AtomicU32,
    inputs: Mutex<BTreeMap<String, InputEndpoint>>,
    operations: Mutex<HashMap<String, PendingOperation>>,
    channel_requests: Mutex<Vec<Value>>,
}

impl MockLiveStream {
    /// Creates a mock recording into `log` whose operations are done
    /// immediately.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Ingest URI the mock assigns to an input.
    pub fn uri_for(input_id: &str) -> String {
        format!("rtmp://203.0.113.20/live/{input_id}")
    }

    /// Completes operations only after `polls` operation lookups.
    #[must_use]
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Operations never complete.
    #[must_use]
    pub fn never_completing(self) -> Self {
        self.with_pending_polls(u32::MAX)
    }

    /// Channel descriptors received so far.
    pub fn channel_requests(&self) -> Vec<Value> {
        lock(&self.channel_requests).clone()
    }

    fn start(&self, parent: &str, response: Value) -> Operation {
        let id = self.next_operation.fetch_add(1, Ordering::Relaxed);
        let name = format!("{parent}/operations/operation-{id}");

        if self.pending_polls == 0 {
            return Operation {
                name,
                done: true,
                error: None,
                response: Some(response),
            };
        }

        lock(&self.operations).insert(
            name.clone(),
            PendingOperation {
                remaining: self.pending_polls,
                response,
            },
        );

        Operation {
            name,
            done: false,
            error: None,
            response: None,
        }
    }
}

#[async_trait]
impl LiveStreamApi for MockLiveStream {
    async fn create_input(
        &self,
        parent: &str,
        input_id: &str,
        input: &Value,
    ) -> Result<Operation> {
        self.log.record("livestream.create_input");

        let name = format!("{parent}/inputs/{input_id}");
        let mut inputs = lock(&self.inputs);
        if inputs.contains_key(&name) {
            return Err(Error::already_exists(format!("input {name} already exists")));
        }

        let endpoint = InputEndpoint {
            name: name.clone(),
            input_type: input["type"].as_str().map(str::to_string),
            uri: Some(Self::uri_for(input_id)),
            labels: serde_json::from_value(input["labels"].clone()).unwrap_or_default(),
        };
        inputs.insert(name, endpoint.clone());
        drop(inputs);

        let mut response = serde_json::to_value(&endpoint)?;
        response["@type"] = json!(INPUT_TYPE_URL);
        Ok(self.start(parent, response))
    }

    async fn get_input(&self, name: &str) -> Result<InputEndpoint> {
        self.log.record("livestream.get_input");
        lock(&self.inputs)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::provider(format!("input {name} not found")))
    }

    async fn create_channel(
        &self,
        parent: &str,
        channel_id: &str,
        channel: &Value,
    ) -> Result<Operation> {
        self.log.record("livestream.create_channel");
        lock(&self.channel_requests).push(channel.clone());

        let response = json!({
            "@type": CHANNEL_TYPE_URL,
            "name": format!("{parent}/channels/{channel_id}"),
            "streamingState": "STOPPED",
            "output": channel["output"],
            "labels": channel["labels"],
        });
        Ok(self.start(parent, response))
    }

    async fn get_operation(&self, name: &str) -> Result<Operation> {
        self.log.record("livestream.get_operation");

        let mut operations = lock(&self.operations);
        let pending = operations
            .get_mut(name)
            .ok_or_else(|| Error::provider(format!("operation {name} not found")))?;
        pending.remaining = pending.remaining.saturating_sub(1);

        if pending.remaining > 0 {
            return Ok(Operation {
                name: name.to_string(),
                done: false,
                error: None,
                response: None,
            });
        }

        let response = pending.response.clone();
        operations.remove(name);
        Ok(Operation {
            name: name.to_string(),
            done: true,
            error: None,
            response: Some(response),
        })
    }
}

/// Fake credentials for mocked sessions.
pub fn gcp_credentials() -> GcpCredentials {
    GcpCredentials::new("sendlive-test", "{}", "us-central1")
}

/// An adapter whose session is already bound to the given mocks.
pub fn gcp_adapter(
    storage: Arc<MockStorage>,
    livestream: Arc<MockLiveStream>,
    options: Option<GcpOptions>,
) -> Result<GcpAdapter> {
    let credentials = gcp_credentials();
    let session = GcpSession::from_clients(credentials.clone(), storage, livestream)?;
    Ok(GcpAdapter::with_session(credentials, options, session))
}
