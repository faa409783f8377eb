//! User API
//!
//! Login exchanges an OAuth `code` for an access token; profile endpoints
//! require that token.

use crate::error::Result;
use crate::helpers::{Params, params};
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Signed-in user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    /// Staff number
    pub xgh: String,
    /// Display name
    pub xm: String,
    pub avatar: String,
    pub roles: Vec<Value>,
    pub permissions: Vec<String>,
    pub identity_type: Vec<IdentityType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityType {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
}

/// Which identity provider issued the login `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSource {
    /// WeCom OAuth redirect (carries a `state` parameter)
    Wecom,
    /// Identity platform redirect
    Sft,
}

impl LoginSource {
    /// WeCom redirects carry `state`; anything else came from the platform
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some(s) if !s.is_empty() => Self::Wecom,
            _ => Self::Sft,
        }
    }

    fn path(self, code: &str) -> String {
        match self {
            Self::Wecom => format!("auth/login/{code}"),
            Self::Sft => format!("auth/loginFromSft/{code}"),
        }
    }
}

/// User endpoints
#[derive(Debug, Clone)]
pub struct UserApi {
    http: HttpClient,
}

impl UserApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange a login code for an access token
    pub async fn login(&self, source: LoginSource, code: &str) -> Result<String> {
        let data: LoginData = self.http.post(&source.path(code), &json!({})).await?;
        Ok(data.access_token)
    }

    pub async fn user_info(&self) -> Result<UserInfo> {
        self.http.get("user/getUserInfo", &Params::new()).await
    }

    pub async fn identity_types(&self, is_admin: bool) -> Result<Vec<IdentityType>> {
        let flag = if is_admin { "1" } else { "0" };
        self.http
            .get("user/getIdentityType", &params([("isAdmin", flag)]))
            .await
    }
}
