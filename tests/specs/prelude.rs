//! Shared helpers for lock behavior specs

pub use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;

pub use leasehold_core::{
    Clock, FakeClock, Generation, HolderId, LeaseLock, LeasePayload, LockConfig, LockError,
    MemoryStore, ObjectStore, RecordingStore, StoreCall, StoreError,
};

/// Lease length used across specs unless a scenario needs its own
pub const LEASE: Duration = Duration::from_secs(30);

/// Lock object name shared by rival holders within a scenario
pub const LOCK: &str = "locks/deploy";

/// Fake clock pinned to a whole second so lease deadlines compare exactly
pub fn pinned_clock() -> FakeClock {
    let clock = FakeClock::new();
    clock.set(chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
    clock
}

/// A lock on [`LOCK`] driven by the scenario's fake clock
pub fn lock_for<S: ObjectStore>(
    store: &S,
    clock: &FakeClock,
    holder: &str,
) -> LeaseLock<S, FakeClock> {
    LeaseLock::with_clock(
        store.clone(),
        LockConfig::new(LOCK).with_holder(HolderId::new(holder)),
        clock.clone(),
    )
}

/// Store that yields to the scheduler before every call, so rivals joined
/// with `tokio::join!` interleave at each backend round trip the way they
/// would across real network suspension points.
#[derive(Clone)]
pub struct YieldingStore {
    inner: MemoryStore,
}

impl YieldingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for YieldingStore {
    async fn create_if_absent(&self, name: &str, payload: &[u8]) -> Result<Generation, StoreError> {
        tokio::task::yield_now().await;
        self.inner.create_if_absent(name, payload).await
    }

    async fn read(&self, name: &str) -> Result<(Vec<u8>, Generation), StoreError> {
        tokio::task::yield_now().await;
        self.inner.read(name).await
    }

    async fn replace_if_generation(
        &self,
        name: &str,
        payload: &[u8],
        generation: &Generation,
    ) -> Result<Generation, StoreError> {
        tokio::task::yield_now().await;
        self.inner.replace_if_generation(name, payload, generation).await
    }

    async fn delete_if_generation(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.delete_if_generation(name, generation).await
    }
}

/// Bump the clock just past the shared lease deadline
pub fn expire_lease(clock: &FakeClock) {
    clock.advance(LEASE + Duration::from_secs(1));
}

/// Decode the lease currently stored under [`LOCK`]
pub async fn stored_lease(store: &MemoryStore) -> LeasePayload {
    let (bytes, _) = store.read(LOCK).await.unwrap();
    LeasePayload::decode(&bytes).unwrap()
}
