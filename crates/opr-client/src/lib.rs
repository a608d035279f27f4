//! OpenProject API v3 client for work package reports.
//!
//! Fetches the raw version, work package and project records that
//! `opr-core` turns into reports. Successful responses are kept in a
//! per-client [`ResponseCache`].

pub mod cache;
pub mod query;

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use opr_core::{Collection, RawProject, RawVersion, RawWorkItem};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use cache::{DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES, ResponseCache};
pub use query::WorkItemQuery;

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default page size ceiling for collection requests.
pub const DEFAULT_PAGE_SIZE: usize = 1000;
const API_PREFIX: &str = "api/v3";
const API_KEY_USER: &str = "apikey";

/// API client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Connection settings for [`Client`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Instance URL without the API prefix, e.g. `https://op.example.com`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub page_size: usize,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// OpenProject API client.
///
/// # Thread Safety
///
/// The client can be shared across threads. The response cache is guarded by
/// a mutex that is never held across a request.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: usize,
    cache: Mutex<ResponseCache>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.api_key.is_empty() {
            return Err(ClientError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if config.api_key.trim().is_empty() {
            return Err(ClientError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            page_size: config.page_size,
            cache: Mutex::new(ResponseCache::new(config.cache_ttl, DEFAULT_MAX_ENTRIES)),
        })
    }

    /// The instance URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Versions of a project, or all visible versions.
    pub async fn fetch_versions(
        &self,
        project: Option<&str>,
    ) -> Result<Vec<RawVersion>, ClientError> {
        let path = match project {
            Some(project) => format!("projects/{project}/versions"),
            None => "versions".to_string(),
        };
        let page: Collection<RawVersion> = self.get_page(&path, &[]).await?;
        Ok(page.into_elements())
    }

    /// Work packages of a project matching `query`.
    pub async fn fetch_work_items(
        &self,
        project: &str,
        query: &WorkItemQuery,
    ) -> Result<Vec<RawWorkItem>, ClientError> {
        Ok(self
            .fetch_work_item_page(project, query)
            .await?
            .into_elements())
    }

    /// Like [`Client::fetch_work_items`], keeping the page counts.
    pub async fn fetch_work_item_page(
        &self,
        project: &str,
        query: &WorkItemQuery,
    ) -> Result<Collection<RawWorkItem>, ClientError> {
        let path = format!("projects/{project}/work_packages");
        let params = query.params(self.page_size);
        let page: Collection<RawWorkItem> = self.get_page(&path, &params).await?;
        if page.total > page.count {
            tracing::warn!(
                project,
                count = page.count,
                total = page.total,
                "work package list truncated by page size"
            );
        }
        Ok(page)
    }

    pub async fn fetch_work_package(&self, id: &str) -> Result<RawWorkItem, ClientError> {
        self.get_json(&format!("work_packages/{id}"), &[]).await
    }

    /// Projects a version is shared with, as a full collection page.
    pub async fn fetch_version_projects(
        &self,
        version: &str,
    ) -> Result<Collection<RawProject>, ClientError> {
        self.get_page(&format!("versions/{version}/projects"), &[])
            .await
    }

    pub async fn fetch_project(&self, project: &str) -> Result<RawProject, ClientError> {
        self.get_json(&format!("projects/{project}"), &[]).await
    }

    /// Fetches a collection page, dropping elements that don't decode.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Collection<T>, ClientError> {
        let raw: Collection<serde_json::Value> = self.get_json(path, params).await?;
        let decoded = raw.decode::<T>();
        if decoded.skipped > 0 {
            tracing::warn!(path, skipped = decoded.skipped, "dropped malformed records");
        }
        Ok(decoded.page)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let key = ResponseCache::key(path, params);
        let cached = self.lock_cache().get(&key);
        if let Some(body) = cached {
            tracing::debug!(path, "using cached response");
            return parse_body(&body);
        }

        let url = self.endpoint(path);
        tracing::debug!(%url, "requesting");
        let response = self
            .http
            .get(&url)
            .basic_auth(API_KEY_USER, Some(&self.api_key))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        let parsed = parse_body(&body)?;
        self.lock_cache().insert(key, body);
        Ok(parsed)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{API_PREFIX}/{}",
            self.base_url,
            path.trim_start_matches('/')
        )
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

fn upstream_error(status: u16, body: &str) -> ClientError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map(|payload| payload.message)
        .unwrap_or_else(|_| body.trim().to_string());
    ClientError::Upstream { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> ClientConfig {
        ClientConfig::new("https://op.example.com/", api_key)
    }

    #[test]
    fn client_rejects_empty_api_key() {
        assert!(matches!(
            Client::new(config("")),
            Err(ClientError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_api_key() {
        assert!(matches!(
            Client::new(config("   ")),
            Err(ClientError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_accepts_valid_api_key() {
        let client = Client::new(config("0123456789abcdef")).unwrap();
        assert_eq!(client.base_url(), "https://op.example.com");
    }

    #[test]
    fn client_debug_redacts_api_key() {
        let client = Client::new(config("secret-key")).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));

        let debug = format!("{:?}", config("secret-key"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn endpoint_joins_api_prefix() {
        let client = Client::new(config("key")).unwrap();
        assert_eq!(
            client.endpoint("versions/3/projects"),
            "https://op.example.com/api/v3/versions/3/projects"
        );
        assert_eq!(
            client.endpoint("/work_packages/12"),
            "https://op.example.com/api/v3/work_packages/12"
        );
    }

    #[test]
    fn upstream_error_prefers_api_message() {
        let body = r#"{"_type":"Error","errorIdentifier":"urn:openproject-org:api:v3:errors:NotFound","message":"The requested resource could not be found."}"#;
        let err = upstream_error(404, body);
        assert!(matches!(
            &err,
            ClientError::Upstream { status: 404, message }
                if message == "The requested resource could not be found."
        ));
        assert_eq!(
            err.to_string(),
            "request failed with status 404: The requested resource could not be found."
        );
    }

    #[test]
    fn upstream_error_falls_back_to_body() {
        let err = upstream_error(502, " Bad Gateway\n");
        assert!(matches!(
            err,
            ClientError::Upstream { status: 502, ref message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn cached_bodies_parse_like_fresh_ones() {
        let body = r#"{"count":1,"total":1,"_embedded":{"elements":[
            {"id":3,"identifier":"web","name":"Website"}
        ]}}"#;
        let page: Collection<RawProject> = parse_body(body).unwrap();
        assert_eq!(page.into_elements()[0].name, "Website");

        let err = parse_body::<Collection<RawProject>>("<html>").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn fetch_serves_cached_response_without_request() {
        let client = Client::new(config("key")).unwrap();
        let body = r#"{"count":1,"total":1,"_embedded":{"elements":[{
            "id":3,"name":"Sprint 1","startDate":"2024-01-01","endDate":"2024-01-14",
            "status":"open","_links":{"definingProject":{"href":"/api/v3/projects/1"}}
        }]}}"#;
        client.lock_cache().insert(
            ResponseCache::key("projects/1/versions", &[]),
            body.to_string(),
        );

        let versions = client.fetch_versions(Some("1")).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].name, "Sprint 1");
    }

    #[tokio::test]
    async fn malformed_work_package_does_not_fail_the_page() {
        let client = Client::new(config("key")).unwrap();
        let query = WorkItemQuery::default();
        let body = r#"{"count":2,"total":2,"_embedded":{"elements":[
            {"id":1,"subject":"Fine","estimatedTime":"PT2H"},
            {"id":2,"subject":"Broken","estimatedTime":5}
        ]}}"#;
        client.lock_cache().insert(
            ResponseCache::key("projects/1/work_packages", &query.params(DEFAULT_PAGE_SIZE)),
            body.to_string(),
        );

        let items = client.fetch_work_items("1", &query).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
    }
}
