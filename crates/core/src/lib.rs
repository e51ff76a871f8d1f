// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! leasehold-core: distributed mutual exclusion over object storage
//!
//! This crate provides:
//! - The lease lock protocol, driven by generation-fenced conditional writes
//! - An object store capability trait with an in-memory reference backend
//! - A clock capability so lease arithmetic is testable
//! - A scoped guard that releases possession on every exit path
//!
//! Exclusivity rests entirely on the store's atomic conditional writes.
//! The protocol performs no internal retries and no local locking; logical
//! races surface as typed [`LockError`]s for the caller to act on.

pub mod clock;
pub mod error;
pub mod guard;
pub mod lock;
pub mod payload;
pub mod state;
pub mod store;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::LockError;
pub use guard::LeaseGuard;
pub use lock::{HolderId, LeaseLock, LockConfig};
pub use payload::LeasePayload;
pub use state::{HeldLease, LockState};
pub use store::{Generation, MemoryStore, ObjectStore, StoreError, TracedStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use store::{RecordingStore, StoreCall};
