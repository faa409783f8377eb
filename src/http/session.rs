//! Session Token
//!
//! Shared holder for the token injected into the `Authorization` header.

use parking_lot::RwLock;
use std::sync::Arc;

/// Shared session token
#[derive(Clone, Debug, Default)]
pub struct SessionToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SessionToken {
    /// Create an empty token holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    /// Forget the token
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Current token, if any non-empty token is stored
    pub fn get(&self) -> Option<String> {
        self.inner.read().clone().filter(|t| !t.is_empty())
    }
}
