// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store capability for generation-fenced lock objects

mod memory;
mod traced;

pub use memory::MemoryStore;
pub use traced::TracedStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod recording;
#[cfg(any(test, feature = "test-support"))]
pub use recording::{RecordingStore, StoreCall};

use async_trait::async_trait;
use thiserror::Error;

/// Opaque version token for one revision of a stored object.
///
/// Every successful write yields a new, distinct generation. Callers never
/// interpret the token; they hand it back verbatim to fence later writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation(pub String);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from object store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("generation precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("transient backend error: {0}")]
    Transient(String),
}

/// Capability for a strongly-consistent object store with conditional writes.
///
/// Each conditional operation is atomic on the backend: it either observes
/// its precondition and applies, or fails without effect. Implementations
/// must report the distinct outcomes exactly as the variants above;
/// [`StoreError::Transient`] is reserved for failures whose effect on the
/// backend is unknown (timeouts, 5xx, connectivity).
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Create the object only if it does not already exist
    async fn create_if_absent(&self, name: &str, payload: &[u8]) -> Result<Generation, StoreError>;

    /// Read the object's payload together with its current generation
    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError>;

    /// Overwrite the object only if its generation still matches
    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError>;

    /// Delete the object only if its generation still matches
    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError>;
}
