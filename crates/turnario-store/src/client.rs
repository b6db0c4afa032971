//! Remote document store client.
//!
//! Speaks the content-addressed REST protocol of the hosted file store:
//! documents travel base64-encoded, every revision is identified by an
//! opaque content hash (`sha`), and writes are compare-and-swap against
//! the hash the writer last observed.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FetchedDocument, StoreError, VersionToken};

/// Default connect timeout for the HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a remote JSON document store.
#[derive(Debug)]
pub struct RemoteStore {
    http: Client,
    base_url: String,
    branch: String,
    secret: String,
}

/// Contents of a `GET {path}` response.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    /// Base64-encoded document payload; the store line-wraps it.
    content: String,
    /// Content hash of this revision.
    sha: String,
}

/// Body of a `PUT {path}` request.
#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    branch: &'a str,
    content: String,
    /// Token of the revision this write is based on. Absent = create.
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Body of a `PUT {path}` response.
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

impl RemoteStore {
    /// Create a new client for the given contents URL.
    ///
    /// `base_url` is the root under which document paths live, e.g.
    /// `https://api.example.com/repos/owner/repo/contents`.
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_timeout(base_url, secret, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new client with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            branch: "main".to_string(),
            secret: secret.into(),
        }
    }

    /// Target a branch other than `main`.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Get the contents base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn document_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch a document and its version token.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist;
    /// the caller must treat that as "empty document, no version token".
    pub async fn get(&self, path: &str) -> Result<FetchedDocument, StoreError> {
        let url = self.document_url(path);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {}", self.secret))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let body: ContentsResponse = self.handle_response(response, path).await?;
        let value = decode_document(&body.content)?;

        debug!(path = %path, token = %body.sha, "fetched document");
        Ok(FetchedDocument {
            value,
            token: VersionToken(body.sha),
        })
    }

    /// Write a document, compare-and-swapping against `token`.
    ///
    /// With `token = None` the store must create a new document and fails
    /// with [`StoreError::Conflict`] if one already exists. With a token,
    /// the write succeeds only if the remote's current token matches, else
    /// it fails with [`StoreError::Conflict`] and the caller should reload.
    /// On success the new token is returned and must be persisted for the
    /// next write.
    pub async fn put(
        &self,
        path: &str,
        document: &serde_json::Value,
        token: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let url = self.document_url(path);

        let payload = serde_json::to_string_pretty(document)?;
        let request_body = PutRequest {
            message,
            branch: &self.branch,
            content: STANDARD.encode(payload.as_bytes()),
            sha: token.map(|t| t.0.as_str()),
        };

        let response = self
            .http
            .put(&url)
            .header("Authorization", format!("token {}", self.secret))
            .json(&request_body)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let body: PutResponse = self.handle_response(response, path).await?;

        debug!(path = %path, token = %body.content.sha, "wrote document");
        Ok(VersionToken(body.content.sha))
    }

    /// Handle an HTTP response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(StoreError::RateLimited { retry_after_secs });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Unauthorized(format!("{}: {}", status, text)));
        }

        // The store answers 409 on a stale compare-and-swap and 422 on a
        // create for a path that already exists.
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(StoreError::Conflict(path.to_string()));
        }

        if status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                message: text,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::InvalidResponse(format!(
                "request failed ({}): {}",
                status, text
            )));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Decode a base64 document payload into JSON.
///
/// The store line-wraps base64 content, so whitespace is stripped first.
fn decode_document(content: &str) -> Result<serde_json::Value, StoreError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Corrupt(format!("invalid base64 payload: {}", e)))?;
    serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt(format!("invalid JSON: {}", e)))
}
