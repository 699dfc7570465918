//! Mock vector index for deterministic testing.
//!
//! Returns programmed hits for specific query texts, with optional
//! latency and failure injection, and keeps a call log so tests can
//! assert which queries actually reached the index (or that none did —
//! the bridge short-circuit property).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use aircheck_core::{Error, Result, VectorHit, VectorIndex};

#[derive(Default)]
struct MockState {
    hits: HashMap<String, Vec<VectorHit>>,
    default_hits: Vec<VectorHit>,
    fail: bool,
    latency: Option<Duration>,
    calls: Vec<String>,
}

/// Mock vector index for testing.
#[derive(Clone, Default)]
pub struct MockVectorIndex {
    state: Arc<Mutex<MockState>>,
}

impl MockVectorIndex {
    /// Create a new mock with no programmed hits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Program hits for a specific query text.
    pub fn with_hits(self, query: impl Into<String>, hits: Vec<VectorHit>) -> Self {
        self.state.lock().unwrap().hits.insert(query.into(), hits);
        self
    }

    /// Program hits returned for any query without a specific mapping.
    pub fn with_default_hits(self, hits: Vec<VectorHit>) -> Self {
        self.state.lock().unwrap().default_hits = hits;
        self
    }

    /// Make every query fail with `SearchDegraded`.
    pub fn with_failure(self) -> Self {
        self.state.lock().unwrap().fail = true;
        self
    }

    /// Add simulated latency before answering.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().latency = Some(latency);
        self
    }

    /// Queries received so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of queries received so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

/// Convenience constructor for a hit.
pub fn hit(external_id: &str, distance: f32) -> VectorHit {
    VectorHit {
        external_id: external_id.to_string(),
        distance,
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn search(&self, text: &str, k: usize) -> Result<Vec<VectorHit>> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(text.to_string());
            if state.fail {
                return Err(Error::SearchDegraded("mock index failure".to_string()));
            }
            state.latency
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock().unwrap();
        let mut hits = state
            .hits
            .get(text)
            .cloned()
            .unwrap_or_else(|| state.default_hits.clone());
        hits.truncate(k);
        Ok(hits)
    }
}
