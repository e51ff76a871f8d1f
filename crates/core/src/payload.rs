// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire payload stored in the lock object

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Contents of the lock object.
///
/// Serialized as JSON with `expires_at` in epoch milliseconds. Millisecond
/// precision is part of the wire contract: deadlines are truncated before
/// writing, so a deadline compares identically before and after a round
/// trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeasePayload {
    /// Wall-clock deadline after which the lease no longer excludes others
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    /// Identity of the holder that wrote the payload, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
}

impl LeasePayload {
    /// Build a payload expiring at `expires_at`, truncated to the wire's
    /// millisecond precision
    pub fn new(expires_at: DateTime<Utc>, holder: Option<String>) -> Self {
        Self {
            expires_at: truncate_to_millis(expires_at),
            holder,
        }
    }

    /// Whether the lease deadline has passed at `now`.
    ///
    /// The boundary counts as expired: a lease expiring exactly at `now`
    /// no longer excludes other holders.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Encode for storage
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a stored payload
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(timestamp.timestamp_millis())
        .single()
        .unwrap_or(timestamp)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
