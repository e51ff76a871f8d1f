// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token sources for authenticating storage requests

use async_trait::async_trait;
use thiserror::Error;

/// OAuth scope required to create, read, and delete lock objects.
pub const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Errors raised while obtaining a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential machinery could not produce a usable token.
    #[error("token acquisition failed: {0}")]
    TokenFailed(String),
}

/// Capability that yields bearer tokens for storage requests.
///
/// Credential discovery, caching, and refresh all live behind this seam;
/// the store only asks for a token it can attach to a single request.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// Fixed token source for tests and short-lived jobs that already hold a
/// pre-fetched token.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}
