//! Lock acquisition specs
//!
//! Verify how rival holders contend for a fresh, held, or expired lock.

use crate::prelude::*;

#[tokio::test]
async fn fresh_acquire_takes_the_lock_and_stores_the_lease() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut lock = lock_for(&store, &clock, "ci-1");

    lock.acquire(LEASE).await.unwrap();

    assert!(lock.is_held());
    assert_eq!(lock.expires_at(), Some(clock.now() + LEASE));

    // Any rival can read who holds the lease and until when
    let lease = stored_lease(&store).await;
    assert_eq!(lease.holder.as_deref(), Some("ci-1"));
    assert_eq!(lease.expires_at, clock.now() + LEASE);

    let observer = lock_for(&store, &clock, "ci-2");
    assert!(observer.is_locked().await.unwrap());
}

#[tokio::test]
async fn second_holder_is_refused_while_the_lease_lives() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut first = lock_for(&store, &clock, "ci-1");
    let mut second = lock_for(&store, &clock, "ci-2");

    first.acquire(LEASE).await.unwrap();
    let err = second.acquire(LEASE).await.unwrap_err();

    assert!(matches!(err, LockError::AlreadyAcquired { .. }));
    assert!(!second.is_held());
    assert!(first.is_held());
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-1"));
}

#[tokio::test]
async fn expired_lease_is_taken_over() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut first = lock_for(&store, &clock, "ci-1");
    let mut second = lock_for(&store, &clock, "ci-2");

    first.acquire(LEASE).await.unwrap();
    expire_lease(&clock);

    second.acquire(LEASE).await.unwrap();

    assert!(second.is_held());
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-2"));
}

#[tokio::test]
async fn takeover_disabled_leaves_the_stale_lease_in_place() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut first = lock_for(&store, &clock, "ci-1");
    let mut second = LeaseLock::with_clock(
        store.clone(),
        LockConfig::new(LOCK)
            .with_holder(HolderId::new("ci-2"))
            .with_takeover(false),
        clock.clone(),
    );

    first.acquire(LEASE).await.unwrap();
    expire_lease(&clock);

    let err = second.acquire(LEASE).await.unwrap_err();

    assert!(matches!(err, LockError::AlreadyAcquired { .. }));
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-1"));
}

#[tokio::test]
async fn reacquiring_while_holding_reports_already_acquired() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut lock = lock_for(&store, &clock, "ci-1");

    lock.acquire(LEASE).await.unwrap();
    let deadline = lock.expires_at();

    // The live lease refuses everyone, its own holder included
    let err = lock.acquire(LEASE).await.unwrap_err();

    assert!(matches!(err, LockError::AlreadyAcquired { .. }));
    assert!(lock.is_held());
    assert_eq!(lock.expires_at(), deadline);
}

#[tokio::test]
async fn acquire_after_clean_release_succeeds() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut first = lock_for(&store, &clock, "ci-1");
    let mut second = lock_for(&store, &clock, "ci-2");

    first.acquire(LEASE).await.unwrap();
    first.release().await.unwrap();

    assert!(!second.is_locked().await.unwrap());
    second.acquire(LEASE).await.unwrap();
    assert!(second.is_held());
}

#[tokio::test]
async fn acquire_recovers_after_a_backend_outage() {
    let store = RecordingStore::new(MemoryStore::new());
    let clock = pinned_clock();
    let mut lock = LeaseLock::with_clock(
        store.clone(),
        LockConfig::new(LOCK).with_holder(HolderId::new("ci-1")),
        clock.clone(),
    );

    store.set_fail_next(StoreError::Transient("storage 503".into()));
    let err = lock.acquire(LEASE).await.unwrap_err();
    assert!(matches!(err, LockError::Backend(_)));
    assert!(!lock.is_held());

    // Nothing sticky remains; the next attempt goes through
    lock.acquire(LEASE).await.unwrap();
    assert!(lock.is_held());
}
