//! # aircheck-core
//!
//! Core types, traits, and abstractions for the aircheck identity
//! resolution engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other aircheck crates depend on: the catalog and
//! resolution models, the repository contracts, text normalization,
//! and the similarity scorer.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod similarity;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use normalize::{normalize, Signature};
pub use similarity::similarity;
pub use traits::*;
