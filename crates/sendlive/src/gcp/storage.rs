//! Cloud Storage JSON API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::ServiceAccountAuth;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpRequest, RestClient};
use crate::tags::Tags;

const STORAGE_SERVICE: &str = "storage";
const STORAGE_BASE_URL: &str = "https://storage.googleapis.com/storage/v1/";

/// A Cloud Storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub labels: Tags,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
}

impl Bucket {
    /// `gs://` URI of a folder inside the bucket.
    pub fn folder_uri(&self, folder: &str) -> String {
        format!("gs://{}/{folder}/", self.name)
    }
}

/// Cloud Storage operations used by the GCP adapter.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Lists every bucket in the project.
    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>>;

    /// Fetches one bucket.
    async fn get_bucket(&self, name: &str) -> Result<Bucket>;

    /// Creates a bucket. The raw response carries the created [`Bucket`].
    async fn create_bucket(
        &self,
        project: &str,
        name: &str,
        location: &str,
        storage_class: &str,
    ) -> Result<ApiResponse>;

    /// Adds or overwrites labels on a bucket; other labels are kept.
    ///
    /// The raw response carries the updated [`Bucket`].
    async fn patch_bucket_labels(&self, name: &str, labels: &Tags) -> Result<ApiResponse>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketList {
    #[serde(default)]
    items: Vec<Bucket>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Cloud Storage client authenticated with a service account.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: RestClient,
    auth: Arc<ServiceAccountAuth>,
    base_url: Url,
}

impl StorageClient {
    /// Creates a client.
    pub fn new(http: RestClient, auth: Arc<ServiceAccountAuth>) -> Result<Self> {
        let base_url = Url::parse(STORAGE_BASE_URL)
            .map_err(|e| Error::configuration("invalid Cloud Storage URL").with_source(e))?;

        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("Cloud Storage base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: HttpRequest, context: &str) -> Result<ApiResponse> {
        let token = self.auth.access_token().await?;
        let request = request.with_header("authorization", format!("Bearer {}", token.expose()));
        self.http.send(request).await?.ensure_success(context)
    }
}

#[async_trait]
impl StorageApi for StorageClient {
    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>> {
        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["b"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("project", project);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let request = HttpRequest::new(STORAGE_SERVICE, Method::GET, url);
            let page: BucketList = self
                .send(request, "list buckets")
                .await?
                .parse("list buckets")?;

            buckets.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(buckets),
            }
        }
    }

    async fn get_bucket(&self, name: &str) -> Result<Bucket> {
        let request = HttpRequest::new(STORAGE_SERVICE, Method::GET, self.endpoint(&["b", name])?);
        self.send(request, "get bucket").await?.parse("get bucket")
    }

    async fn create_bucket(
        &self,
        project: &str,
        name: &str,
        location: &str,
        storage_class: &str,
    ) -> Result<ApiResponse> {
        let mut url = self.endpoint(&["b"])?;
        url.query_pairs_mut().append_pair("project", project);

        let request = HttpRequest::new(STORAGE_SERVICE, Method::POST, url).with_json(&json!({
            "name": name,
            "location": location,
            "storageClass": storage_class,
        }))?;
        self.send(request, "create bucket").await
    }

    async fn patch_bucket_labels(&self, name: &str, labels: &Tags) -> Result<ApiResponse> {
        let url = self.endpoint(&["b", name])?;
        let request = HttpRequest::new(STORAGE_SERVICE, Method::PATCH, url)
            .with_json(&json!({ "labels": labels }))?;
        self.send(request, "patch bucket labels").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_deserialize() {
        let bucket: Bucket = serde_json::from_value(json!({
            "kind": "storage#bucket",
            "name": "sendlive-a-b-c",
            "location": "US",
            "storageClass": "STANDARD",
            "labels": { "created-by": "sendlive" },
        }))
        .unwrap();

        assert_eq!(bucket.labels["created-by"], "sendlive");
        assert_eq!(bucket.storage_class.as_deref(), Some("STANDARD"));
        assert_eq!(bucket.folder_uri("my_stream"), "gs://sendlive-a-b-c/my_stream/");
    }

    #[test]
    fn test_bucket_list_without_items() {
        let list: BucketList = serde_json::from_value(json!({ "kind": "storage#buckets" })).unwrap();
        assert!(list.items.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
