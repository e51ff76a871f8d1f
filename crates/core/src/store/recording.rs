// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording store wrapper for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Generation, ObjectStore, StoreError};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateIfAbsent { name: String },
    Read { name: String },
    ReplaceIfGeneration { name: String, generation: Generation },
    DeleteIfGeneration { name: String, generation: Generation },
}

/// Store wrapper that records calls and injects failures for testing
#[derive(Clone)]
pub struct RecordingStore<S> {
    inner: S,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_next: Arc<Mutex<Option<StoreError>>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(None)),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Fail the next store call with the given error
    pub fn set_fail_next(&self, error: StoreError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RecordingStore<S> {
    async fn create_if_absent(&self, name: &str, payload: &[u8]) -> Result<Generation, StoreError> {
        self.record(StoreCall::CreateIfAbsent {
            name: name.to_string(),
        });
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.create_if_absent(name, payload).await
    }

    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError> {
        self.record(StoreCall::Read {
            name: name.to_string(),
        });
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.read(name).await
    }

    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError> {
        self.record(StoreCall::ReplaceIfGeneration {
            name: name.to_string(),
            generation: generation.clone(),
        });
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.replace_if_generation(name, payload, generation).await
    }

    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteIfGeneration {
            name: name.to_string(),
            generation: generation.clone(),
        });
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        self.inner.delete_if_generation(name, generation).await
    }
}
