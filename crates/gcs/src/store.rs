// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store backed by the Cloud Storage JSON API.
//!
//! The lease payload is embedded in the object's `metadata` map under the
//! `lease` key, so a single metadata GET returns payload and generation in
//! one atomic round trip. Conditional writes use the `ifGenerationMatch`
//! parameter; the API reports a failed precondition as HTTP 412.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leasehold_core::store::{Generation, ObjectStore, StoreError};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use crate::auth::TokenSource;

const DEFAULT_API_URL: &str = "https://www.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed multipart/related boundary. Request bodies are JSON and a short
/// marker string, neither of which can collide with it.
const BOUNDARY: &str = "cf58b63b6ce6f37881e9740f24be22d7";

/// Errors raised while constructing a [`GcsStore`].
#[derive(Debug, Error)]
pub enum GcsError {
    /// The configured API endpoint is not a usable base URL.
    #[error("invalid api url: {0}")]
    InvalidApiUrl(String),
    /// No token source was configured for a non-emulator endpoint.
    #[error("a token source is required outside emulator mode")]
    MissingTokenSource,
    /// The HTTP client could not be built.
    #[error("http client construction failed: {0}")]
    ClientConstruction(String),
}

/// Configuration for [`GcsStore`].
pub struct GcsConfig {
    bucket: String,
    api_url: Option<String>,
    client: Option<Client>,
    token: Option<Arc<dyn TokenSource>>,
    timeout: Duration,
}

impl GcsConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            api_url: None,
            client: None,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point at an alternate endpoint such as a local emulator.
    ///
    /// Emulator requests are sent anonymously; any configured token source
    /// is ignored.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Use an already-built HTTP client instead of constructing one.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_token_source(mut self, token: Arc<dyn TokenSource>) -> Self {
        self.token = Some(token);
        self
    }

    /// Total request timeout for the constructed client. Ten seconds by
    /// default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`ObjectStore`] implementation over a Cloud Storage bucket.
#[derive(Clone)]
pub struct GcsStore {
    client: Client,
    bucket: String,
    base: Url,
    token: Option<Arc<dyn TokenSource>>,
}

impl std::fmt::Debug for GcsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsStore")
            .field("bucket", &self.bucket)
            .field("base", &self.base)
            .field("token", &self.token.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

impl GcsStore {
    pub fn new(config: GcsConfig) -> Result<Self, GcsError> {
        let emulator = config.api_url.is_some();
        let api_url = config
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base = Url::parse(&api_url)
            .map_err(|e| GcsError::InvalidApiUrl(format!("{api_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(GcsError::InvalidApiUrl(api_url));
        }
        let token = if emulator {
            None
        } else {
            Some(config.token.ok_or(GcsError::MissingTokenSource)?)
        };
        let client = match config.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| GcsError::ClientConstruction(e.to_string()))?,
        };
        Ok(Self {
            client,
            bucket: config.bucket,
            base,
            token,
        })
    }

    fn object_url(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        // The base is checked at construction; an opaque URL never gets here.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", self.bucket.as_str(), "o", name]);
        }
        url
    }

    fn upload_url(&self, fence: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        }
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("ifGenerationMatch", fence);
        url
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        match &self.token {
            None => Ok(request),
            Some(source) => {
                let token = source
                    .bearer_token()
                    .await
                    .map_err(|e| StoreError::Transient(format!("auth: {e}")))?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    async fn upload(
        &self,
        name: &str,
        payload: &[u8],
        fence: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let body = multipart_body(name, payload)?;
        let request = self
            .client
            .post(self.upload_url(fence))
            .header("Accept", "application/json")
            .header(
                "Content-Type",
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body);
        let request = self.authorize(request).await?;
        request.send().await.map_err(transport)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn create_if_absent(
        &self,
        name: &str,
        payload: &[u8],
    ) -> Result<Generation, StoreError> {
        let response = self.upload(name, payload, "0").await?;
        match response.status() {
            status if status.is_success() => {
                let value = decode_resource(response).await?;
                generation_from(&value)
            }
            StatusCode::PRECONDITION_FAILED => Err(StoreError::AlreadyExists(name.to_string())),
            _ => Err(unexpected_status("create", response).await),
        }
    }

    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError> {
        let request = self
            .client
            .get(self.object_url(name))
            .header("Accept", "application/json");
        let request = self.authorize(request).await?;
        let response = request.send().await.map_err(transport)?;
        match response.status() {
            status if status.is_success() => {
                let value = decode_resource(response).await?;
                let generation = generation_from(&value)?;
                Ok((lease_bytes(&value), generation))
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(name.to_string())),
            _ => Err(unexpected_status("read", response).await),
        }
    }

    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError> {
        let response = self.upload(name, payload, &generation.0).await?;
        match response.status() {
            status if status.is_success() => {
                let value = decode_resource(response).await?;
                generation_from(&value)
            }
            // A vanished object also surfaces as a failed precondition here;
            // the API does not distinguish the two for fenced uploads.
            StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::PreconditionFailed(name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(name.to_string())),
            _ => Err(unexpected_status("replace", response).await),
        }
    }

    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError> {
        let mut url = self.object_url(name);
        url.query_pairs_mut()
            .append_pair("ifGenerationMatch", &generation.0);
        let request = self.client.delete(url);
        let request = self.authorize(request).await?;
        let response = request.send().await.map_err(transport)?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::PreconditionFailed(name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(name.to_string())),
            _ => Err(unexpected_status("delete", response).await),
        }
    }
}

/// Build the multipart/related body for an object insert. The first part
/// carries the object resource with the lease payload embedded under
/// `metadata.lease`; the second is a fixed marker for the object content.
fn multipart_body(name: &str, payload: &[u8]) -> Result<Vec<u8>, StoreError> {
    let lease = std::str::from_utf8(payload)
        .map_err(|e| StoreError::Transient(format!("payload is not utf-8: {e}")))?;
    let resource = serde_json::json!({
        "name": name,
        "metadata": { "lease": lease },
    });
    let body = [
        format!("--{BOUNDARY}"),
        "Content-Type: application/json; charset=UTF-8".to_string(),
        String::new(),
        resource.to_string(),
        format!("--{BOUNDARY}"),
        "Content-Type: text/plain".to_string(),
        String::new(),
        "lock".to_string(),
        String::new(),
        format!("--{BOUNDARY}--"),
        String::new(),
    ]
    .join("\r\n");
    Ok(body.into_bytes())
}

async fn decode_resource(response: reqwest::Response) -> Result<serde_json::Value, StoreError> {
    response.json().await.map_err(transport)
}

/// Pull the generation token out of an object resource. Emulators have been
/// seen returning it as a bare number rather than the documented string.
fn generation_from(value: &serde_json::Value) -> Result<Generation, StoreError> {
    let raw = value
        .get("generation")
        .ok_or_else(|| StoreError::Transient("response missing generation".to_string()))?;
    let token = match raw {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => {
            return Err(StoreError::Transient(format!(
                "unexpected generation value: {raw}"
            )))
        }
    };
    Ok(Generation(token))
}

/// Extract the embedded lease payload. A missing metadata entry yields empty
/// bytes, which the lock engine then rejects as malformed.
fn lease_bytes(value: &serde_json::Value) -> Vec<u8> {
    value
        .get("metadata")
        .and_then(|m| m.get("lease"))
        .and_then(|l| l.as_str())
        .map(|s| s.as_bytes().to_vec())
        .unwrap_or_default()
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transient(e.to_string())
}

async fn unexpected_status(op: &str, response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::Transient(format!(
        "{op}: unexpected status {status}: {}",
        snippet(&body)
    ))
}

fn snippet(body: &str) -> String {
    let mut snippet: String = body.chars().take(256).collect();
    if snippet.len() < body.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
