// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use tracing::Instrument;

use super::{Generation, ObjectStore, StoreError};

/// Wrapper that adds tracing to any ObjectStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TracedStore<S> {
    async fn create_if_absent(&self, name: &str, payload: &[u8]) -> Result<Generation, StoreError> {
        let span = tracing::info_span!("store.create", name);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_if_absent(name, payload).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(generation) => tracing::info!(
                    %generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "created"
                ),
                // Losing a conditional create is ordinary contention
                Err(StoreError::AlreadyExists(_)) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "already exists"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "create failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError> {
        let span = tracing::info_span!("store.read", name);
        async {
            let result = self.inner.read(name).await;

            match &result {
                Ok((payload, generation)) => {
                    tracing::debug!(%generation, payload_len = payload.len(), "read")
                }
                Err(StoreError::NotFound(_)) => tracing::debug!("not found"),
                Err(e) => tracing::error!(error = %e, "read failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError> {
        let span = tracing::info_span!("store.replace", name, fence = %generation);
        async {
            let start = std::time::Instant::now();
            let result = self
                .inner
                .replace_if_generation(name, payload, generation)
                .await;
            let elapsed = start.elapsed();

            match &result {
                Ok(new_generation) => tracing::info!(
                    generation = %new_generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "replaced"
                ),
                // A stale fence means someone else won the race
                Err(StoreError::PreconditionFailed(_)) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "generation changed"
                ),
                Err(StoreError::NotFound(_)) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "object gone"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "replace failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.delete", name, fence = %generation);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.delete_if_generation(name, generation).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "deleted"),
                Err(StoreError::PreconditionFailed(_)) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "generation changed"
                ),
                Err(StoreError::NotFound(_)) => tracing::debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "object gone"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "delete failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
