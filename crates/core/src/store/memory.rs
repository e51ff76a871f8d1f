// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory object store with atomic conditional writes

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Generation, ObjectStore, StoreError};

struct StoredObject {
    payload: Vec<u8>,
    generation: Generation,
}

#[derive(Default)]
struct MemoryState {
    objects: HashMap<String, StoredObject>,
    next_generation: u64,
}

/// In-process object store backed by a mutex-serialized map.
///
/// Conditional writes hold the map lock across the precondition check and
/// the mutation, so fencing is genuinely atomic. Serves as the reference
/// backend and as the substrate for protocol tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(state: &mut MemoryState) -> Generation {
        state.next_generation += 1;
        Generation(state.next_generation.to_string())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn create_if_absent(&self, name: &str, payload: &[u8]) -> Result<Generation, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.objects.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let generation = Self::next_generation(&mut state);
        state.objects.insert(
            name.to_string(),
            StoredObject {
                payload: payload.to_vec(),
                generation: generation.clone(),
            },
        );
        Ok(generation)
    }

    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let object = state
            .objects
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Ok((object.payload.clone(), object.generation.clone()))
    }

    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match state.objects.get(name) {
            None => return Err(StoreError::NotFound(name.to_string())),
            Some(object) if object.generation != *generation => {
                return Err(StoreError::PreconditionFailed(name.to_string()));
            }
            Some(_) => {}
        }

        let next = Self::next_generation(&mut state);
        state.objects.insert(
            name.to_string(),
            StoredObject {
                payload: payload.to_vec(),
                generation: next.clone(),
            },
        );
        Ok(next)
    }

    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match state.objects.get(name) {
            None => return Err(StoreError::NotFound(name.to_string())),
            Some(object) if object.generation != *generation => {
                return Err(StoreError::PreconditionFailed(name.to_string()));
            }
            Some(_) => {}
        }

        state.objects.remove(name);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
