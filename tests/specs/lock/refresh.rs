//! Lease refresh specs
//!
//! Verify a holder can keep its lease alive and learns promptly when the
//! lease was taken from it.

use crate::prelude::*;

#[tokio::test]
async fn refresh_extends_the_deadline_past_the_original_lease() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut holder = lock_for(&store, &clock, "ci-1");
    let mut rival = lock_for(&store, &clock, "ci-2");

    holder.acquire(LEASE).await.unwrap();

    clock.advance(Duration::from_secs(20));
    holder.refresh(LEASE).await.unwrap();
    assert_eq!(holder.expires_at(), Some(clock.now() + LEASE));

    // Past the original deadline the refreshed lease still shuts rivals out
    clock.advance(Duration::from_secs(15));
    let err = rival.acquire(LEASE).await.unwrap_err();
    assert!(matches!(err, LockError::AlreadyAcquired { .. }));
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-1"));
}

#[tokio::test]
async fn refresh_without_the_lock_is_a_usage_error() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut lock = lock_for(&store, &clock, "ci-1");

    let err = lock.refresh(LEASE).await.unwrap_err();
    assert!(matches!(err, LockError::NotAcquired { .. }));
}

#[tokio::test]
async fn lapsed_holder_learns_of_the_takeover_on_refresh() {
    let store = MemoryStore::new();
    let clock = pinned_clock();
    let mut first = lock_for(&store, &clock, "ci-1");
    let mut second = lock_for(&store, &clock, "ci-2");

    first.acquire(LEASE).await.unwrap();
    expire_lease(&clock);
    second.acquire(LEASE).await.unwrap();

    let err = first.refresh(LEASE).await.unwrap_err();

    assert!(matches!(err, LockError::LockLost { .. }));
    assert!(!first.is_held());

    // The successor's lease is untouched by the loser's refresh attempt
    second.refresh(LEASE).await.unwrap();
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-2"));
}

#[tokio::test]
async fn refresh_survives_a_backend_outage() {
    let store = RecordingStore::new(MemoryStore::new());
    let clock = pinned_clock();
    let mut lock = LeaseLock::with_clock(
        store.clone(),
        LockConfig::new(LOCK).with_holder(HolderId::new("ci-1")),
        clock.clone(),
    );

    lock.acquire(LEASE).await.unwrap();
    let deadline = lock.expires_at();

    store.set_fail_next(StoreError::Transient("storage 503".into()));
    let err = lock.refresh(LEASE).await.unwrap_err();

    // A flaky backend never costs the holder its possession
    assert!(matches!(err, LockError::Backend(_)));
    assert!(lock.is_held());
    assert_eq!(lock.expires_at(), deadline);

    lock.refresh(LEASE).await.unwrap();
    assert_eq!(lock.expires_at(), Some(clock.now() + LEASE));
}
