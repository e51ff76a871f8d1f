// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease lock protocol over a generation-fenced object store
//!
//! One named object is the single source of truth for one lock. Possession
//! is a lease: every grant stamps a wall-clock deadline into the object,
//! and an expired lease may be taken over by anyone, fenced on the
//! generation the takeover observed. Logical races surface as typed
//! errors; the protocol never retries them on its own.

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::LockError;
use crate::guard::LeaseGuard;
use crate::payload::LeasePayload;
use crate::state::LockState;
use crate::store::{Generation, ObjectStore, StoreError};

/// Unique identifier for a lock holder
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random holder identity
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lock configuration
#[derive(Clone, Debug)]
pub struct LockConfig {
    /// Object name identifying this lock in the store
    pub name: String,
    /// Identity recorded in the lock object while held
    pub holder: HolderId,
    /// Whether acquire may take over an expired lease
    pub takeover: bool,
}

impl LockConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            holder: HolderId::generate(),
            takeover: true,
        }
    }

    pub fn with_holder(mut self, holder: HolderId) -> Self {
        self.holder = holder;
        self
    }

    /// Control takeover of expired leases; on by default
    pub fn with_takeover(mut self, takeover: bool) -> Self {
        self.takeover = takeover;
        self
    }
}

/// Handle for one contender on one named lock.
///
/// A handle is single-owner: operations take `&mut self` and possession
/// tracked here belongs to this handle alone. Exclusivity across processes
/// comes entirely from the store's conditional writes, so no local locking
/// is involved. Handles to the same name must not be shared within a task;
/// one handle per contender.
///
/// A cancelled in-flight operation may or may not have reached the store.
/// The safe recovery is a follow-up [`release`](Self::release), which is
/// idempotent at the protocol level.
pub struct LeaseLock<S: ObjectStore, C: Clock = SystemClock> {
    config: LockConfig,
    store: S,
    clock: C,
    state: LockState,
}

impl<S: ObjectStore> LeaseLock<S> {
    pub fn new(store: S, config: LockConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: ObjectStore, C: Clock> LeaseLock<S, C> {
    pub fn with_clock(store: S, config: LockConfig, clock: C) -> Self {
        Self {
            config,
            store,
            clock,
            state: LockState::new(),
        }
    }

    /// Object name this handle contends for
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Identity recorded in the lock object while held
    pub fn holder(&self) -> &HolderId {
        &self.config.holder
    }

    /// Whether this handle currently believes it holds the lock
    pub fn is_held(&self) -> bool {
        self.state.is_held()
    }

    /// Generation granted by this handle's last successful write
    pub fn held_generation(&self) -> Option<&Generation> {
        self.state.held().map(|held| &held.generation)
    }

    /// Deadline of this handle's current lease
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.state.held().map(|held| held.expires_at)
    }

    /// Acquire the lock with a lease of `lease` from now.
    ///
    /// Fails with [`LockError::AlreadyAcquired`] while another party holds
    /// a live lease. An expired lease is taken over with a replace fenced
    /// on the generation observed alongside the stale deadline; losing
    /// that race also reports [`LockError::AlreadyAcquired`]. The caller
    /// decides whether and when to try again.
    pub async fn acquire(&mut self, lease: Duration) -> Result<(), LockError> {
        let payload = self.lease_payload(lease)?;
        let bytes = self.encode(&payload)?;

        match self.store.create_if_absent(&self.config.name, &bytes).await {
            Ok(generation) => {
                self.state.grant(generation, payload.expires_at);
                tracing::debug!(name = %self.config.name, "lock acquired");
                Ok(())
            }
            Err(StoreError::AlreadyExists(_)) => self.acquire_contended(lease).await,
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// Extend the current lease to `extend_by` from now.
    ///
    /// The replace is fenced on the held generation. A fence failure means
    /// the lease was taken over in the meantime; the handle forgets
    /// possession and the caller must treat its critical section as no
    /// longer protected.
    pub async fn refresh(&mut self, extend_by: Duration) -> Result<(), LockError> {
        let Some(held) = self.state.held().cloned() else {
            return Err(LockError::NotAcquired {
                name: self.config.name.clone(),
            });
        };

        let payload = self.lease_payload(extend_by)?;
        let bytes = self.encode(&payload)?;

        match self
            .store
            .replace_if_generation(&self.config.name, &bytes, &held.generation)
            .await
        {
            Ok(generation) => {
                self.state.grant(generation, payload.expires_at);
                tracing::debug!(name = %self.config.name, expires_at = %payload.expires_at, "lease refreshed");
                Ok(())
            }
            Err(StoreError::PreconditionFailed(_) | StoreError::NotFound(_)) => {
                self.state.clear();
                tracing::warn!(name = %self.config.name, "lease lost during refresh");
                Err(LockError::LockLost {
                    name: self.config.name.clone(),
                })
            }
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// Release the lock if this handle holds it.
    ///
    /// Releasing without possession is a successful no-op and touches no
    /// backend state. A fence failure on the delete still ends possession
    /// locally but reports [`LockError::LockLost`], since the exclusivity
    /// window may have closed before this deliberate release.
    pub async fn release(&mut self) -> Result<(), LockError> {
        let Some(held) = self.state.held().cloned() else {
            return Ok(());
        };

        match self
            .store
            .delete_if_generation(&self.config.name, &held.generation)
            .await
        {
            Ok(()) => {
                self.state.clear();
                tracing::debug!(name = %self.config.name, "lock released");
                Ok(())
            }
            Err(StoreError::PreconditionFailed(_) | StoreError::NotFound(_)) => {
                self.state.clear();
                tracing::warn!(name = %self.config.name, "lease already lost at release");
                Err(LockError::LockLost {
                    name: self.config.name.clone(),
                })
            }
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// Acquire and wrap possession in a guard that releases on exit
    pub async fn acquire_scoped(
        &mut self,
        lease: Duration,
    ) -> Result<LeaseGuard<'_, S, C>, LockError> {
        self.acquire(lease).await?;
        Ok(LeaseGuard::new(self))
    }

    /// Whether the lock is currently held by anyone, from the store's
    /// point of view.
    ///
    /// An absent object and an expired lease both read as unlocked. A
    /// payload that cannot be decoded reads as locked: its expiry cannot
    /// be determined, so the conservative answer is that the lock is
    /// taken.
    pub async fn is_locked(&self) -> Result<bool, LockError> {
        match self.store.read(&self.config.name).await {
            Ok((bytes, _)) => match LeasePayload::decode(&bytes) {
                Ok(payload) => Ok(!payload.is_expired(self.clock.now())),
                Err(_) => Ok(true),
            },
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// Contended path: the conditional create lost, so decide between
    /// waiting out a live lease and taking over an expired one.
    ///
    /// The expiry check and the takeover write are separate round trips;
    /// fencing the write on the generation read next to the stale deadline
    /// is what keeps the pair race-safe.
    async fn acquire_contended(&mut self, lease: Duration) -> Result<(), LockError> {
        let (bytes, generation) = match self.store.read(&self.config.name).await {
            Ok(found) => found,
            // Holder released between our create and this read
            Err(StoreError::NotFound(_)) => return self.acquire_vacated(lease).await,
            Err(e) => return Err(LockError::Backend(e)),
        };

        let existing = LeasePayload::decode(&bytes).map_err(|e| LockError::MalformedPayload {
            name: self.config.name.clone(),
            reason: e.to_string(),
        })?;

        if !existing.is_expired(self.clock.now()) {
            tracing::debug!(
                name = %self.config.name,
                holder = existing.holder.as_deref().unwrap_or("unknown"),
                expires_at = %existing.expires_at,
                "lock held under a live lease"
            );
            return Err(LockError::AlreadyAcquired {
                name: self.config.name.clone(),
            });
        }

        if !self.config.takeover {
            tracing::debug!(name = %self.config.name, "lease expired but takeover is disabled");
            return Err(LockError::AlreadyAcquired {
                name: self.config.name.clone(),
            });
        }

        let payload = self.lease_payload(lease)?;
        let bytes = self.encode(&payload)?;

        match self
            .store
            .replace_if_generation(&self.config.name, &bytes, &generation)
            .await
        {
            Ok(new_generation) => {
                tracing::info!(
                    name = %self.config.name,
                    previous_holder = existing.holder.as_deref().unwrap_or("unknown"),
                    "took over expired lease"
                );
                self.state.grant(new_generation, payload.expires_at);
                Ok(())
            }
            // Someone else re-armed or took the lease first
            Err(StoreError::PreconditionFailed(_)) => Err(LockError::AlreadyAcquired {
                name: self.config.name.clone(),
            }),
            // The expired holder deleted it between our read and write
            Err(StoreError::NotFound(_)) => self.acquire_vacated(lease).await,
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// One more conditional create after observing the object vanish.
    ///
    /// Single attempt: a rival appearing again surfaces as
    /// [`LockError::AlreadyAcquired`] instead of the protocol looping.
    async fn acquire_vacated(&mut self, lease: Duration) -> Result<(), LockError> {
        let payload = self.lease_payload(lease)?;
        let bytes = self.encode(&payload)?;

        match self.store.create_if_absent(&self.config.name, &bytes).await {
            Ok(generation) => {
                self.state.grant(generation, payload.expires_at);
                tracing::debug!(name = %self.config.name, "lock acquired after release");
                Ok(())
            }
            Err(StoreError::AlreadyExists(_)) => Err(LockError::AlreadyAcquired {
                name: self.config.name.clone(),
            }),
            Err(e) => Err(LockError::Backend(e)),
        }
    }

    /// Payload for a grant made now, expiring `lease` from now
    fn lease_payload(&self, lease: Duration) -> Result<LeasePayload, LockError> {
        if lease.is_zero() {
            return Err(LockError::InvalidLeaseDuration(lease));
        }
        let span = chrono::Duration::from_std(lease)
            .map_err(|_| LockError::InvalidLeaseDuration(lease))?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(span)
            .ok_or(LockError::InvalidLeaseDuration(lease))?;
        Ok(LeasePayload::new(
            expires_at,
            Some(self.config.holder.0.clone()),
        ))
    }

    fn encode(&self, payload: &LeasePayload) -> Result<Vec<u8>, LockError> {
        payload.encode().map_err(|e| LockError::MalformedPayload {
            name: self.config.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Hand possession to the guard's drop path, forgetting it here
    pub(crate) fn take_held(&mut self) -> Option<(S, String, Generation)> {
        self.state
            .clear()
            .map(|held| (self.store.clone(), self.config.name.clone(), held.generation))
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
