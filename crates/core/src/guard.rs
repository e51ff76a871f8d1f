// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped possession with release on every exit path

use std::time::Duration;

use crate::clock::Clock;
use crate::error::LockError;
use crate::lock::LeaseLock;
use crate::store::ObjectStore;

/// Guard over an acquired lock that releases when the scope exits.
///
/// Explicit [`release`](Self::release) surfaces fence failures. The drop
/// path runs only if possession is still held at exit and is best-effort:
/// it spawns a fenced delete, so a takeover that already happened is left
/// untouched.
pub struct LeaseGuard<'a, S: ObjectStore, C: Clock> {
    lock: &'a mut LeaseLock<S, C>,
    released: bool,
}

impl<'a, S: ObjectStore, C: Clock> LeaseGuard<'a, S, C> {
    pub(crate) fn new(lock: &'a mut LeaseLock<S, C>) -> Self {
        Self {
            lock,
            released: false,
        }
    }

    /// Whether the underlying handle still holds the lock
    pub fn is_held(&self) -> bool {
        self.lock.is_held()
    }

    /// Deadline of the current lease
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.lock.expires_at()
    }

    /// Extend the lease while inside the scope
    pub async fn refresh(&mut self, extend_by: Duration) -> Result<(), LockError> {
        self.lock.refresh(extend_by).await
    }

    /// Release explicitly, surfacing fence failures
    pub async fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.lock.release().await
    }
}

impl<S: ObjectStore, C: Clock> Drop for LeaseGuard<'_, S, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Some((store, name, generation)) = self.lock.take_held() else {
            return;
        };

        // Drop cannot await; the fenced delete runs as a detached task
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.delete_if_generation(&name, &generation).await {
                        tracing::warn!(name = %name, error = %e, "release on drop failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    name = %name,
                    "lock guard dropped outside a runtime; lease left to expire"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
