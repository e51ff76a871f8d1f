// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Google Cloud Storage backend for leasehold locks
//!
//! Object generations give the conditional create, replace, and delete
//! primitives the lock engine fences on. Works against the public API with
//! a bearer token, or anonymously against a local emulator.

pub mod auth;
pub mod store;

pub use auth::{AuthError, StaticTokenSource, TokenSource, STORAGE_SCOPE};
pub use store::{GcsConfig, GcsError, GcsStore};
