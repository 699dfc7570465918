//! # aircheck-index
//!
//! Vector index client for aircheck's semantic matching strategy.
//!
//! The index is an external, best-effort collaborator: it answers
//! nearest-neighbour queries for raw signature text with (external id,
//! distance) pairs. Every failure mode — unreachable endpoint, timeout,
//! malformed response — maps to `Error::SearchDegraded` so the matcher
//! skips the strategy instead of failing the match.

pub mod http;
pub mod mock;

pub use http::{HttpVectorIndex, VectorIndexConfig};
pub use mock::MockVectorIndex;
