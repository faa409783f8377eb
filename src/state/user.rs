//! User session state
//!
//! The token lives in a [`SessionToken`] shared with the HTTP client, so a
//! login is visible to every subsequent request.

use crate::api::{LoginSource, UserApi, UserInfo};
use crate::error::Result;
use crate::http::SessionToken;
use parking_lot::RwLock;
use std::sync::Arc;

/// Signed-in user
#[derive(Debug, Clone)]
pub struct UserStore {
    token: SessionToken,
    info: Arc<RwLock<UserInfo>>,
}

impl UserStore {
    pub fn new(token: SessionToken) -> Self {
        Self {
            token,
            info: Arc::new(RwLock::new(UserInfo::default())),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.get()
    }

    pub fn info(&self) -> UserInfo {
        self.info.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.get().is_some()
    }

    /// Log in with the redirect `code`/`state` and load the profile
    pub async fn init(&self, api: &UserApi, code: &str, state: Option<&str>) -> Result<()> {
        let token = api.login(LoginSource::from_state(state), code).await?;
        self.token.set(token);
        tracing::info!("user logged in");

        let info = api.user_info().await?;
        *self.info.write() = info;
        Ok(())
    }

    pub fn set_info(&self, info: UserInfo) {
        *self.info.write() = info;
    }

    pub fn logout(&self) {
        self.token.clear();
        *self.info.write() = UserInfo::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_with_client_holder() {
        let token = SessionToken::new();
        let store = UserStore::new(token.clone());
        assert!(!store.is_logged_in());

        token.set("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.set_info(UserInfo {
            xm: "Li Lei".to_string(),
            ..Default::default()
        });
        store.logout();
        assert!(token.get().is_none());
        assert_eq!(store.info(), UserInfo::default());
    }
}
