//! WeCom API
//!
//! JS-API signature issued by the backend for the hosting page URL.

use crate::error::Result;
use crate::helpers::params;
use crate::http::HttpClient;
use crate::sdk::SignatureSource;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Signature material for `ww.register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsapiSignature {
    /// Corp ID the page is registered under
    pub app_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    pub nonce_str: String,
    pub signature: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// WeCom endpoints
#[derive(Debug, Clone)]
pub struct WecomApi {
    http: HttpClient,
    signature_path: String,
}

impl WecomApi {
    pub fn new(http: HttpClient, signature_path: impl Into<String>) -> Self {
        Self {
            http,
            signature_path: signature_path.into(),
        }
    }

    /// Signature for `page_url` (without its fragment)
    pub async fn jsapi_signature(&self, page_url: &str) -> Result<JsapiSignature> {
        let url = page_url.split('#').next().unwrap_or(page_url);
        self.http
            .get(&self.signature_path, &params([("url", url)]))
            .await
    }
}

#[async_trait]
impl SignatureSource for WecomApi {
    async fn signature(&self, page_url: &str) -> Result<JsapiSignature> {
        self.jsapi_signature(page_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_timestamp_accepted() {
        let sig: JsapiSignature = serde_json::from_value(json!({
            "appId": "ww123",
            "timestamp": 1700000000,
            "nonceStr": "abc",
            "signature": "f00"
        }))
        .expect("decode");
        assert_eq!(sig.timestamp, "1700000000");
        assert_eq!(sig.app_id, "ww123");
    }
}
