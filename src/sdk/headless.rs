//! Headless SDK hosts
//!
//! Used when no web view is attached (the bootstrap binary, smoke checks):
//! scripts are fetched over HTTP to prove they are reachable, and the WeCom
//! bridge accepts registration but has no client to invoke JS-APIs on.

use crate::error::{Error, Result};
use crate::sdk::{
    ChatOptions, ContactOptions, LocationOptions, RegisterConfig, ScriptHost, WecomBridge,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Fetches scripts over HTTP and remembers the ones that loaded
pub struct HttpScriptHost {
    client: reqwest::Client,
    loaded: Mutex<HashSet<String>>,
}

impl HttpScriptHost {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            loaded: Mutex::new(HashSet::new()),
        })
    }
}

#[async_trait]
impl ScriptHost for HttpScriptHost {
    fn has_script(&self, src: &str) -> bool {
        self.loaded.lock().contains(src)
    }

    async fn append_script(&self, src: &str) -> Result<()> {
        let response = self.client.get(src).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        tracing::debug!("fetched script {} ({} bytes)", src, body.len());
        self.loaded.lock().insert(src.to_string());
        Ok(())
    }
}

/// Bridge with no WeCom client behind it
#[derive(Default)]
pub struct HeadlessBridge {
    registration: RwLock<Option<RegisterConfig>>,
}

impl HeadlessBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted registration
    pub fn registration(&self) -> Option<RegisterConfig> {
        self.registration.read().clone()
    }

    fn detached(api: &str) -> Error {
        Error::Invalid {
            message: format!("{api} needs a WeCom client; none is attached"),
        }
    }
}

#[async_trait]
impl WecomBridge for HeadlessBridge {
    async fn register(&self, config: RegisterConfig) -> Result<()> {
        tracing::info!(
            "registered corp {} for {} JS-APIs",
            config.corp_id,
            config.js_api_list.len()
        );
        *self.registration.write() = Some(config);
        Ok(())
    }

    async fn select_enterprise_contact(&self, _options: &ContactOptions) -> Result<Value> {
        Err(Self::detached("selectEnterpriseContact"))
    }

    async fn open_enterprise_chat(&self, _options: &ChatOptions) -> Result<Value> {
        Err(Self::detached("openEnterpriseChat"))
    }

    async fn get_location(&self, _options: &LocationOptions) -> Result<Value> {
        Err(Self::detached("getLocation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::JsapiSignature;

    #[tokio::test]
    async fn test_headless_bridge_keeps_registration() {
        let bridge = HeadlessBridge::new();
        assert!(bridge.registration().is_none());

        bridge
            .register(RegisterConfig {
                corp_id: "ww1".to_string(),
                js_api_list: vec!["getLocation".to_string()],
                signature: JsapiSignature {
                    app_id: "ww1".to_string(),
                    timestamp: "1".to_string(),
                    nonce_str: "n".to_string(),
                    signature: "s".to_string(),
                },
            })
            .await
            .expect("register");

        assert_eq!(bridge.registration().map(|r| r.corp_id), Some("ww1".to_string()));
        assert!(bridge.get_location(&LocationOptions::default()).await.is_err());
    }

    #[test]
    fn test_script_host_starts_empty() {
        let host = HttpScriptHost::new(Duration::from_secs(1)).expect("client");
        assert!(!host.has_script("https://map.qq.com/api/gljs"));
    }
}
