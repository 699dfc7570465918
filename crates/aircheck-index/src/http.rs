//! HTTP vector index backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use aircheck_core::{defaults, Error, Result, VectorHit, VectorIndex};

/// Default vector index endpoint.
pub const DEFAULT_INDEX_URL: &str = defaults::VECTOR_INDEX_URL;

/// Timeout for index queries (seconds).
pub const INDEX_TIMEOUT_SECS: u64 = defaults::VECTOR_TIMEOUT_SECS;

/// Configuration for the HTTP vector index client.
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Base URL of the index service.
    pub base_url: String,
    /// Per-query timeout.
    pub timeout: Duration,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEX_URL.to_string(),
            timeout: Duration::from_secs(INDEX_TIMEOUT_SECS),
        }
    }
}

impl VectorIndexConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AIRCHECK_VECTOR_URL` | `http://127.0.0.1:7700` | Index base URL |
    /// | `AIRCHECK_VECTOR_TIMEOUT_SECS` | `5` | Per-query timeout |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("AIRCHECK_VECTOR_URL").unwrap_or_else(|_| DEFAULT_INDEX_URL.to_string());
        let timeout_secs = std::env::var("AIRCHECK_VECTOR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(INDEX_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    text: &'a str,
    k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<SearchResponseHit>,
}

#[derive(Deserialize)]
struct SearchResponseHit {
    external_id: String,
    distance: f32,
}

/// HTTP-backed vector index client.
pub struct HttpVectorIndex {
    client: Client,
    config: VectorIndexConfig,
}

impl HttpVectorIndex {
    /// Create a new client with the given configuration.
    pub fn new(config: VectorIndexConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "index",
            component = "vector_index",
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "Initializing vector index client"
        );

        Self { client, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(VectorIndexConfig::from_env())
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn search(&self, text: &str, k: usize) -> Result<Vec<VectorHit>> {
        let start = Instant::now();
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));

        // The reqwest client carries its own timeout, but a hung DNS
        // resolution or connect can exceed it; the outer guard makes the
        // deadline unconditional.
        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.post(&url).json(&SearchRequest { text, k }).send(),
        )
        .await
        .map_err(|_| {
            warn!(
                subsystem = "index",
                component = "vector_index",
                op = "search",
                timeout_secs = self.config.timeout.as_secs(),
                "Vector index query timed out"
            );
            Error::SearchDegraded("vector index timeout".to_string())
        })?
        .map_err(|e| Error::SearchDegraded(format!("vector index unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::SearchDegraded(format!(
                "vector index returned {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::SearchDegraded(format!("vector index response: {e}")))?;

        let hits: Vec<VectorHit> = parsed
            .hits
            .into_iter()
            .map(|h| VectorHit {
                external_id: h.external_id,
                distance: h.distance,
            })
            .collect();

        debug!(
            subsystem = "index",
            component = "vector_index",
            op = "search",
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Vector index query complete"
        );

        Ok(hits)
    }
}
