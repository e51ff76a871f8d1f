// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lock protocol

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while driving the lock protocol
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock is held by someone else under a live lease
    #[error("lock already acquired: {name}")]
    AlreadyAcquired { name: String },

    /// The operation requires possession and this handle holds none
    #[error("lock not acquired: {name}")]
    NotAcquired { name: String },

    /// A fenced write discovered the lease was taken over or removed
    #[error("lock lost: {name}")]
    LockLost { name: String },

    /// The lock object's payload could not be encoded or decoded
    #[error("malformed lock payload for {name}: {reason}")]
    MalformedPayload { name: String, reason: String },

    /// Lease durations must be positive and fit wall-clock arithmetic
    #[error("invalid lease duration: {0:?}")]
    InvalidLeaseDuration(Duration),

    /// The backend failed in a way the protocol cannot interpret
    #[error("backend error: {0}")]
    Backend(#[source] StoreError),
}
