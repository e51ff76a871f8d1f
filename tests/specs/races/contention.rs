//! Contention specs
//!
//! Drive rival holders through a store that yields at every round trip, so
//! their joined futures genuinely interleave, and verify the conditional
//! writes admit exactly one winner.

use crate::prelude::*;

#[tokio::test]
async fn rivals_racing_for_a_fresh_lock_admit_exactly_one_winner() {
    let store = MemoryStore::new();
    let racing = YieldingStore::new(store.clone());
    let clock = pinned_clock();
    let mut first = lock_for(&racing, &clock, "ci-1");
    let mut second = lock_for(&racing, &clock, "ci-2");

    let (a, b) = tokio::join!(first.acquire(LEASE), second.acquire(LEASE));

    assert!(a.is_ok() != b.is_ok(), "exactly one rival must win");
    assert!(first.is_held() != second.is_held());

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser.unwrap_err(),
        LockError::AlreadyAcquired { .. }
    ));

    let winner = if first.is_held() { "ci-1" } else { "ci-2" };
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some(winner));
}

#[tokio::test]
async fn rivals_racing_for_an_expired_lease_admit_exactly_one_winner() {
    let store = MemoryStore::new();
    let racing = YieldingStore::new(store.clone());
    let clock = pinned_clock();
    let mut original = lock_for(&store, &clock, "ci-1");
    let mut second = lock_for(&racing, &clock, "ci-2");
    let mut third = lock_for(&racing, &clock, "ci-3");

    original.acquire(LEASE).await.unwrap();
    expire_lease(&clock);

    // Both rivals read the same expired generation before either writes;
    // the fence lets only one takeover land
    let (b, c) = tokio::join!(second.acquire(LEASE), third.acquire(LEASE));

    assert!(b.is_ok() != c.is_ok(), "exactly one rival must take over");
    assert!(second.is_held() != third.is_held());

    let winner = if second.is_held() { "ci-2" } else { "ci-3" };
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some(winner));
}

#[tokio::test]
async fn rival_is_refused_while_the_holder_refreshes() {
    let store = MemoryStore::new();
    let racing = YieldingStore::new(store.clone());
    let clock = pinned_clock();
    let mut holder = lock_for(&racing, &clock, "ci-1");
    let mut rival = lock_for(&racing, &clock, "ci-2");

    holder.acquire(LEASE).await.unwrap();
    clock.advance(Duration::from_secs(10));

    let (refreshed, acquired) = tokio::join!(holder.refresh(LEASE), rival.acquire(LEASE));

    // A live lease refreshes cleanly no matter how the rival interleaves
    refreshed.unwrap();
    assert!(matches!(
        acquired.unwrap_err(),
        LockError::AlreadyAcquired { .. }
    ));
    assert_eq!(stored_lease(&store).await.holder.as_deref(), Some("ci-1"));
}
