//! dyemind-common — Shared error taxonomy and HTTP plumbing used across all DyeMind crates.

pub mod error;
pub mod sandbox;

// Re-export commonly used types
pub use error::{DyeMindError, FailureKind, ProviderError};
