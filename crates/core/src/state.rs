// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local view of lock possession

use chrono::{DateTime, Utc};

use crate::store::Generation;

/// Lease granted to this handle by a successful fenced write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeldLease {
    /// Generation returned by the write that granted the lease
    pub generation: Generation,
    /// Deadline stamped into the lock object by that write
    pub expires_at: DateTime<Utc>,
}

/// Lock possession as last observed by this handle.
///
/// Held means the most recent protocol step granted possession. The wall
/// clock may already be past `expires_at`; possession ends only when a
/// later step observes the loss.
#[derive(Clone, Debug, Default)]
pub struct LockState {
    held: Option<HeldLease>,
}

impl LockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn held(&self) -> Option<&HeldLease> {
        self.held.as_ref()
    }

    /// Record a granted or renewed lease
    pub fn grant(&mut self, generation: Generation, expires_at: DateTime<Utc>) {
        self.held = Some(HeldLease {
            generation,
            expires_at,
        });
    }

    /// Forget possession, returning the lease that was held
    pub fn clear(&mut self) -> Option<HeldLease> {
        self.held.take()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
