//! GCP provisioning workflow.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{AsRefStr, Display};

use super::livestream::{CHANNEL_TYPE_URL, INPUT_TYPE_URL};
use super::naming::{DEFAULT_NAME_PREFIX, DEFAULT_NAME_WORDS, generate_dns_compliant_name};
use super::{
    Bucket, GcpCredentials, GcpOptions, GcpSession, InputEndpoint, LiveChannel, LiveStreamApi,
    Operation, TRACING_TARGET, builder,
};
use crate::credentials::ServiceProvider;
use crate::error::{Error, ErrorKind, Result};
use crate::poll::{PollPolicy, poll_until};
use crate::stream::Stream;
use crate::tags::{self, CREATED_BY_VALUE, Tags};

/// Lifecycle of a [`GcpAdapter`].
///
/// `Failed` is fatal to the step that reached it: the error is returned and
/// nothing created earlier is rolled back. The adapter itself stays usable
/// for further calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GcpState {
    /// No session yet.
    #[default]
    Unconfigured,
    /// Storage and Live Stream clients are available.
    SessionReady,
    /// The output bucket is resolved.
    BucketReady,
    /// An input was created or reused.
    InputReady,
    /// A channel was created.
    ChannelReady,
    /// The last step returned an error.
    Failed,
}

/// Provisions streams on the Live Stream API, writing output to Cloud
/// Storage.
#[derive(Debug)]
pub struct GcpAdapter {
    credentials: GcpCredentials,
    options: GcpOptions,
    session: Option<GcpSession>,
    state: GcpState,
    bucket: Option<Bucket>,
    inputs: Vec<InputEndpoint>,
    channels: Vec<LiveChannel>,
}

impl GcpAdapter {
    /// Creates an adapter without a session.
    pub fn new(credentials: GcpCredentials, options: Option<GcpOptions>) -> Self {
        Self {
            credentials,
            options: options.unwrap_or_default(),
            session: None,
            state: GcpState::Unconfigured,
            bucket: None,
            inputs: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// Creates an adapter around an existing session.
    pub fn with_session(
        credentials: GcpCredentials,
        options: Option<GcpOptions>,
        session: GcpSession,
    ) -> Self {
        let mut adapter = Self::new(credentials, options);
        adapter.session = Some(session);
        adapter.state = GcpState::SessionReady;
        adapter
    }

    /// Builds the session. Calling it again keeps the existing session.
    pub fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let session = GcpSession::new(self.credentials.clone(), self.options.http.clone())
            .inspect_err(|_| self.state = GcpState::Failed)?;

        tracing::debug!(
            target: TRACING_TARGET,
            project = %self.credentials.project_id,
            region = %self.credentials.region,
            "GCP session ready"
        );

        self.session = Some(session);
        self.state = GcpState::SessionReady;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GcpState {
        self.state
    }

    /// Options in effect.
    pub fn options(&self) -> &GcpOptions {
        &self.options
    }

    /// Bucket resolved by this adapter, if any.
    pub fn bucket(&self) -> Option<&Bucket> {
        self.bucket.as_ref()
    }

    /// Inputs created or fetched through this adapter.
    pub fn inputs(&self) -> &[InputEndpoint] {
        &self.inputs
    }

    /// Channels created through this adapter.
    pub fn channels(&self) -> &[LiveChannel] {
        &self.channels
    }

    fn session(&self) -> Result<&GcpSession> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::configuration("GCP session is not set up, call connect first"))
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = GcpState::Failed;
        }
        result
    }

    /// GCP labels: provenance label merged in, keys hyphenated and
    /// lower-cased.
    fn labels(tags: Option<&Tags>) -> Tags {
        tags::normalize_keys_lowercase(&tags::normalize(tags))
    }

    /// Provisions a bucket, an input and a channel writing to
    /// `gs://<bucket>/<name>/`, and returns the stream with the input's
    /// ingest URI.
    pub async fn create_stream(&mut self, name: &str, tags: Option<&Tags>) -> Result<Stream> {
        self.session()?;

        tracing::info!(target: TRACING_TARGET, stream = name, "Provisioning GCP stream");

        let bucket = self.resolve_bucket(None, tags).await?;
        let input = self.create_input(name, tags, None).await?;
        self.create_channel(name, input.id(), &bucket.folder_uri(name), tags)
            .await?;

        let endpoint = input.uri.clone().filter(|uri| !uri.is_empty());
        let endpoint = self.track(endpoint.ok_or_else(|| {
            Error::provider(format!("input {} has no ingest URI", input.name))
        }))?;

        Ok(Stream::new(name, ServiceProvider::Gcp).with_endpoint(endpoint))
    }

    /// Finds the bucket carrying the provenance label.
    ///
    /// Returns `None` when there is none; more than one is an inconsistent
    /// state and fails rather than picking one.
    pub async fn find_tagged_bucket(&self) -> Result<Option<Bucket>> {
        let storage = self.session()?.storage()?;
        let label_key = tags::created_by_label_key();

        let mut found: Vec<Bucket> = storage
            .list_buckets(&self.credentials.project_id)
            .await?
            .into_iter()
            .filter(|bucket| {
                bucket.labels.get(&label_key).map(String::as_str) == Some(CREATED_BY_VALUE)
            })
            .collect();

        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(Error::provider(format!(
                "expected to find one bucket labelled {label_key}={CREATED_BY_VALUE}, found {n}: {}",
                found
                    .iter()
                    .map(|bucket| bucket.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Resolves the output bucket.
    ///
    /// Uses `bucket_name`, else [`GcpOptions::bucket_name`], else the bucket
    /// already resolved by this adapter, else the provenance-labelled bucket.
    /// When nothing is found a new bucket is created, unless
    /// [`GcpOptions::auto_create_bucket`] is off.
    pub async fn resolve_bucket(
        &mut self,
        bucket_name: Option<&str>,
        tags: Option<&Tags>,
    ) -> Result<Bucket> {
        let result = self.resolve_bucket_inner(bucket_name, tags).await;
        let bucket = self.track(result)?;
        self.bucket = Some(bucket.clone());
        self.state = GcpState::BucketReady;
        Ok(bucket)
    }

    async fn resolve_bucket_inner(
        &mut self,
        bucket_name: Option<&str>,
        tags: Option<&Tags>,
    ) -> Result<Bucket> {
        let storage = self.session()?.storage()?;

        if let Some(name) = bucket_name.or(self.options.bucket_name.as_deref()) {
            tracing::debug!(target: TRACING_TARGET, bucket = name, "Using named bucket");
            return storage.get_bucket(name).await;
        }

        if let Some(bucket) = &self.bucket {
            return Ok(bucket.clone());
        }

        if let Some(bucket) = self.find_tagged_bucket().await? {
            tracing::debug!(
                target: TRACING_TARGET,
                bucket = %bucket.name,
                "Reusing provenance-labelled bucket"
            );
            return Ok(bucket);
        }

        if !self.options.auto_create_bucket {
            return Err(Error::configuration(
                "no bucket was named or found and bucket creation is disabled",
            ));
        }

        let name = generate_dns_compliant_name(DEFAULT_NAME_PREFIX, DEFAULT_NAME_WORDS);
        self.create_bucket_inner(&name, tags).await
    }

    /// Creates a bucket and labels it.
    pub async fn create_bucket(&mut self, name: &str, tags: Option<&Tags>) -> Result<Bucket> {
        let result = self.create_bucket_inner(name, tags).await;
        let bucket = self.track(result)?;
        self.bucket = Some(bucket.clone());
        self.state = GcpState::BucketReady;
        Ok(bucket)
    }

    async fn create_bucket_inner(&self, name: &str, tags: Option<&Tags>) -> Result<Bucket> {
        let storage = self.session()?.storage()?;

        let response = storage
            .create_bucket(
                &self.credentials.project_id,
                name,
                &self.options.bucket_location,
                &self.options.storage_class,
            )
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = name,
            status = response.status,
            response = %response.body,
            "Create bucket response"
        );

        let created: Bucket = response.parse("create bucket")?;
        let labels = Self::labels(tags);
        let response = storage.patch_bucket_labels(&created.name, &labels).await?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = %created.name,
            status = response.status,
            response = %response.body,
            "Patch bucket labels response"
        );

        response.parse("patch bucket labels")
    }

    /// Fetches an input by id, optionally remembering it.
    pub async fn get_input(&mut self, input_id: &str, cache: bool) -> Result<InputEndpoint> {
        let result = self.get_input_inner(input_id).await;
        let input = self.track(result)?;
        if cache && !self.inputs.iter().any(|known| known.name == input.name) {
            self.inputs.push(input.clone());
        }
        Ok(input)
    }

    async fn get_input_inner(&self, input_id: &str) -> Result<InputEndpoint> {
        let livestream = self.session()?.livestream()?;
        let name = format!("{}/inputs/{input_id}", self.credentials.parent());
        livestream.get_input(&name).await
    }

    /// Creates a push input and waits for it.
    ///
    /// When the input already exists it is fetched and reused if `reuse`
    /// (default [`GcpOptions::reuse_existing_input`]) is set, otherwise the
    /// [`ErrorKind::AlreadyExists`] error is returned.
    pub async fn create_input(
        &mut self,
        input_id: &str,
        tags: Option<&Tags>,
        reuse: Option<bool>,
    ) -> Result<InputEndpoint> {
        let reuse = reuse.unwrap_or(self.options.reuse_existing_input);

        let input = match self.create_input_inner(input_id, tags).await {
            Err(error) if error.kind == ErrorKind::AlreadyExists && reuse => {
                tracing::info!(
                    target: TRACING_TARGET,
                    input = input_id,
                    "Input already exists, reusing it"
                );
                let input = self.get_input(input_id, true).await?;
                self.state = GcpState::InputReady;
                return Ok(input);
            }
            result => self.track(result)?,
        };

        self.inputs.push(input.clone());
        self.state = GcpState::InputReady;
        Ok(input)
    }

    async fn create_input_inner(
        &self,
        input_id: &str,
        tags: Option<&Tags>,
    ) -> Result<InputEndpoint> {
        let livestream = self.session()?.livestream()?;
        let parent = self.credentials.parent();
        let descriptor = builder::build_input(self.options.input_type, &Self::labels(tags));

        let operation = livestream.create_input(&parent, input_id, &descriptor).await?;
        let response = wait_for(
            &livestream,
            operation,
            INPUT_TYPE_URL,
            self.options.input_poll_policy(),
        )
        .await?;

        tracing::info!(
            target: TRACING_TARGET,
            input = input_id,
            response = %response,
            "Created input"
        );

        decode(response, "create input")
    }

    /// Creates a channel attached to `input_id`, writing to `output_uri`,
    /// and waits for it.
    pub async fn create_channel(
        &mut self,
        channel_id: &str,
        input_id: &str,
        output_uri: &str,
        tags: Option<&Tags>,
    ) -> Result<LiveChannel> {
        let result = self
            .create_channel_inner(channel_id, input_id, output_uri, tags)
            .await;
        let channel = self.track(result)?;
        self.channels.push(channel.clone());
        self.state = GcpState::ChannelReady;
        Ok(channel)
    }

    async fn create_channel_inner(
        &self,
        channel_id: &str,
        input_id: &str,
        output_uri: &str,
        tags: Option<&Tags>,
    ) -> Result<LiveChannel> {
        let livestream = self.session()?.livestream()?;
        let parent = self.credentials.parent();
        let descriptor = builder::build_channel(
            &format!("{parent}/channels/{channel_id}"),
            &format!("{parent}/inputs/{input_id}"),
            output_uri,
            &Self::labels(tags),
        );

        let operation = livestream
            .create_channel(&parent, channel_id, &descriptor)
            .await?;
        let response = wait_for(
            &livestream,
            operation,
            CHANNEL_TYPE_URL,
            self.options.channel_poll_policy(),
        )
        .await?;

        tracing::info!(
            target: TRACING_TARGET,
            channel = channel_id,
            response = %response,
            "Created channel"
        );

        decode(response, "create channel")
    }
}

/// Waits for `operation` to resolve to a resource of `expected_type`.
async fn wait_for(
    livestream: &Arc<dyn LiveStreamApi>,
    operation: Operation,
    expected_type: &'static str,
    policy: PollPolicy,
) -> Result<Value> {
    let name = operation.name.clone();
    if let Some(response) = operation.resolve(expected_type)? {
        return Ok(response);
    }

    poll_until(&name, policy, || {
        let livestream = livestream.clone();
        let name = name.clone();
        async move {
            livestream
                .get_operation(&name)
                .await?
                .resolve(expected_type)
        }
    })
    .await
}

fn decode<T: DeserializeOwned>(response: Value, context: &str) -> Result<T> {
    serde_json::from_value(response.clone()).map_err(|e| {
        Error::provider(format!("{context}: unexpected resource"))
            .with_response(response)
            .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::mock::{CallLog, MockLiveStream, MockStorage, gcp_adapter, gcp_credentials};

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn adapter(
        storage: MockStorage,
        livestream: MockLiveStream,
        options: Option<GcpOptions>,
    ) -> GcpAdapter {
        gcp_adapter(Arc::new(storage), Arc::new(livestream), options).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_stream_creates_labelled_bucket_then_polls_input() {
        let log = CallLog::default();
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()).with_pending_polls(2),
            None,
        );

        let stream = adapter.create_stream("my-stream", None).await.unwrap();

        assert_eq!(log.count("storage.create_bucket"), 1);
        assert_eq!(log.count("storage.patch_bucket_labels"), 1);
        let calls = log.calls();
        let create = calls.iter().position(|c| c == "storage.create_bucket").unwrap();
        let patch = calls.iter().position(|c| c == "storage.patch_bucket_labels").unwrap();
        let input = calls.iter().position(|c| c == "livestream.create_input").unwrap();
        assert!(create < patch && patch < input);

        let input = &adapter.inputs()[0];
        assert_eq!(stream.endpoint, input.uri);
        assert!(stream.is_ready());
        assert_eq!(stream.provider, ServiceProvider::Gcp);

        let bucket = adapter.bucket().unwrap();
        assert!(bucket.name.starts_with("sendlive-"));
        assert_eq!(bucket.labels["created-by"], "sendlive");

        let channel = &adapter.channels()[0];
        assert_eq!(
            channel.output.as_ref().unwrap().uri.as_deref(),
            Some(format!("gs://{}/my-stream/", bucket.name).as_str())
        );
        assert_eq!(adapter.state(), GcpState::ChannelReady);
    }

    #[tokio::test]
    async fn test_bucket_discovery_finds_single_labelled_bucket() {
        let log = CallLog::default();
        let storage = MockStorage::new(log.clone())
            .with_bucket(MockStorage::bucket("unrelated", &[]))
            .with_bucket(MockStorage::bucket("ours", &[("created-by", "sendlive")]));
        let adapter = adapter(storage, MockLiveStream::new(log.clone()), None);

        let bucket = adapter.find_tagged_bucket().await.unwrap().unwrap();
        assert_eq!(bucket.name, "ours");
    }

    #[tokio::test]
    async fn test_bucket_discovery_finds_nothing() {
        let log = CallLog::default();
        let storage = MockStorage::new(log.clone())
            .with_bucket(MockStorage::bucket("other", &[("created-by", "someone")]));
        let adapter = adapter(storage, MockLiveStream::new(log.clone()), None);

        assert!(adapter.find_tagged_bucket().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bucket_discovery_rejects_duplicates() {
        let log = CallLog::default();
        let storage = MockStorage::new(log.clone())
            .with_bucket(MockStorage::bucket("first", &[("created-by", "sendlive")]))
            .with_bucket(MockStorage::bucket("second", &[("created-by", "sendlive")]));
        let mut adapter = adapter(storage, MockLiveStream::new(log.clone()), None);

        let error = adapter.find_tagged_bucket().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Provider);

        let error = adapter.resolve_bucket(None, None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Provider);
        assert_eq!(log.count("storage.create_bucket"), 0);
        assert_eq!(adapter.state(), GcpState::Failed);
    }

    #[tokio::test]
    async fn test_resolve_bucket_prefers_named_bucket() {
        let log = CallLog::default();
        let storage = MockStorage::new(log.clone())
            .with_bucket(MockStorage::bucket("named", &[]))
            .with_bucket(MockStorage::bucket("ours", &[("created-by", "sendlive")]));
        let options = GcpOptions::default().with_bucket_name("named");
        let mut adapter = adapter(storage, MockLiveStream::new(log.clone()), Some(options));

        let bucket = adapter.resolve_bucket(None, None).await.unwrap();
        assert_eq!(bucket.name, "named");
        assert_eq!(log.count("storage.list_buckets"), 0);
    }

    #[tokio::test]
    async fn test_resolve_bucket_without_auto_create() {
        let log = CallLog::default();
        let options = GcpOptions::default().with_auto_create_bucket(false);
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()),
            Some(options),
        );

        let error = adapter.resolve_bucket(None, None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert_eq!(log.count("storage.create_bucket"), 0);
    }

    #[tokio::test]
    async fn test_create_input_twice_reuses_existing() {
        let log = CallLog::default();
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()),
            None,
        );

        let first = adapter.create_input("my-input", None, None).await.unwrap();
        let second = adapter.create_input("my-input", None, None).await.unwrap();

        assert_eq!(first.name, second.name);
        assert_eq!(first.uri, second.uri);
        assert_eq!(log.count("livestream.create_input"), 2);
        assert_eq!(log.count("livestream.get_input"), 1);
        assert_eq!(adapter.inputs().len(), 1);
    }

    #[tokio::test]
    async fn test_reused_input_marks_adapter_ready() {
        let log = CallLog::default();
        let livestream = Arc::new(MockLiveStream::new(log.clone()));

        let mut first = gcp_adapter(
            Arc::new(MockStorage::new(log.clone())),
            livestream.clone(),
            None,
        )
        .unwrap();
        first.create_input("my-input", None, None).await.unwrap();

        let mut second =
            gcp_adapter(Arc::new(MockStorage::new(log.clone())), livestream, None).unwrap();
        assert_eq!(second.state(), GcpState::SessionReady);

        let input = second.create_input("my-input", None, None).await.unwrap();
        assert_eq!(second.state(), GcpState::InputReady);
        assert_eq!(second.inputs(), std::slice::from_ref(&input));
        assert_eq!(log.count("livestream.get_input"), 1);
    }

    #[tokio::test]
    async fn test_bucket_mutations_log_raw_response() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let log = CallLog::default();
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()),
            None,
        );
        adapter.create_bucket("sendlive-raw", None).await.unwrap();

        let output = logs.contents();
        assert!(output.contains("Create bucket response"));
        assert!(output.contains("Patch bucket labels response"));
        assert!(output.contains(r#""kind":"storage#bucket""#));
        assert!(output.contains(r#""metageneration":"2""#));
    }

    #[tokio::test]
    async fn test_create_input_conflict_without_reuse() {
        let log = CallLog::default();
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()),
            None,
        );

        adapter.create_input("my-input", None, None).await.unwrap();
        let error = adapter
            .create_input("my-input", None, Some(false))
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::AlreadyExists);
        assert_eq!(log.count("livestream.get_input"), 0);
    }

    #[tokio::test]
    async fn test_create_input_labels_are_normalized() {
        let log = CallLog::default();
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()),
            None,
        );

        let tags = Tags::from([("Team Name".to_string(), "live".to_string())]);
        let input = adapter
            .create_input("my-input", Some(&tags), None)
            .await
            .unwrap();

        assert_eq!(input.labels["team-name"], "live");
        assert_eq!(input.labels["created-by"], "sendlive");
        assert_eq!(input.input_type.as_deref(), Some("RTMP_PUSH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_polling_times_out() {
        let log = CallLog::default();
        let options = GcpOptions::default()
            .with_timeouts(Duration::from_secs(30), Duration::from_secs(30));
        let mut adapter = adapter(
            MockStorage::new(log.clone()),
            MockLiveStream::new(log.clone()).never_completing(),
            Some(options),
        );

        let error = adapter.create_input("slow", None, None).await.unwrap_err();

        assert_eq!(error.kind, ErrorKind::OperationTimeout);
        assert!(error.is_provider_error());
        assert!(error.operation.unwrap().contains("/operations/"));
        assert!(adapter.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_calls_before_connect_are_configuration_errors() {
        let mut adapter = GcpAdapter::new(gcp_credentials(), None);

        let error = adapter.create_input("my-input", None, None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let error = adapter
            .create_channel("my-channel", "my-input", "gs://bucket/x/", None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let error = adapter.create_stream("my-stream", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_create_channel_references_input() {
        let log = CallLog::default();
        let livestream = Arc::new(MockLiveStream::new(log.clone()));
        let mut adapter =
            gcp_adapter(Arc::new(MockStorage::new(log.clone())), livestream.clone(), None).unwrap();

        adapter
            .create_channel("my-channel", "my-input", "gs://bucket/my-channel/", None)
            .await
            .unwrap();

        let descriptor = livestream.channel_requests().pop().unwrap();
        assert_eq!(
            descriptor["inputAttachments"][0]["input"],
            "projects/sendlive-test/locations/us-central1/inputs/my-input"
        );
        assert_eq!(descriptor["labels"]["created-by"], "sendlive");
    }
}
