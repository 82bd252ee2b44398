//! Access to the remote export and speaker photos
//!
//! [`ConferenceSource`] is the seam between the pipeline and the network so the
//! pipeline can be exercised without a server.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Downloaded photo bytes and the type the server declared for them
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ConferenceSource: Send + Sync {
    /// Fetch the whole export as untyped JSON.
    async fn fetch_programme(&self) -> Result<Value>;

    /// Download one photo. Any failure is reported as an error for the caller to recover.
    async fn fetch_photo(&self, url: &str) -> Result<Photo>;
}

/// Source backed by the configured HTTP endpoint
pub struct HttpSource {
    client: Client,
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hallsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    if raw.trim().is_empty() {
        return Err(Error::Transport(
            "no endpoint configured (set CONFERENCE_HALL or --endpoint)".to_string(),
        ));
    }
    Url::parse(raw).map_err(|e| Error::Transport(format!("invalid URL '{raw}': {e}")))
}

#[async_trait]
impl ConferenceSource for HttpSource {
    async fn fetch_programme(&self) -> Result<Value> {
        let url = parse_url(&self.endpoint)?;
        info!("Fetching conference export from {}", url.host_str().unwrap_or("endpoint"));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to fetch export: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(format!(
                "export request failed with status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read export body: {e}")))?;
        debug!("Received {} byte export", body.len());

        serde_json::from_slice(&body)
            .map_err(|e| Error::Transport(format!("Export is not valid JSON: {e}")))
    }

    async fn fetch_photo(&self, url: &str) -> Result<Photo> {
        let url = parse_url(url)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(format!(
                "photo request failed with status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(Photo {
            bytes,
            content_type,
        })
    }
}

/// In-memory source for tests
#[derive(Clone, Default)]
pub struct MockSource {
    programme: Option<Value>,
    photos: HashMap<String, Photo>,
    requested_photos: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
    pub fn new(programme: Value) -> Self {
        Self {
            programme: Some(programme),
            ..Self::default()
        }
    }

    /// A source whose export request fails.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_photo(mut self, url: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.photos.insert(
            url.to_string(),
            Photo {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    /// Photo URLs requested so far, in request order.
    pub async fn requested_photos(&self) -> Vec<String> {
        self.requested_photos.lock().await.clone()
    }
}

#[async_trait]
impl ConferenceSource for MockSource {
    async fn fetch_programme(&self) -> Result<Value> {
        self.programme
            .clone()
            .ok_or_else(|| Error::Transport("connection refused".to_string()))
    }

    async fn fetch_photo(&self, url: &str) -> Result<Photo> {
        self.requested_photos.lock().await.push(url.to_string());
        self.photos
            .get(url)
            .cloned()
            .ok_or_else(|| Error::HttpStatus(format!("photo {url} returned 404 Not Found")))
    }
}
