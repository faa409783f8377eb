//! WeCom JS-SDK
//!
//! Registration needs a backend-issued signature for the hosting page; every
//! JS-API call afterwards goes through [`WecomClient`], which loads the SDK on
//! demand and bounds each call by the lifecycle timeout.

use crate::api::JsapiSignature;
use crate::config::{SdkOptions, WecomConfig};
use crate::error::{Error, Result};
use crate::sdk::{SdkLifecycle, SdkLoader};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Issues JS-API signatures for a page URL
#[async_trait]
pub trait SignatureSource: Send + Sync + 'static {
    async fn signature(&self, page_url: &str) -> Result<JsapiSignature>;
}

/// Registration payload handed to the client SDK
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterConfig {
    pub corp_id: String,
    pub js_api_list: Vec<String>,
    pub signature: JsapiSignature,
}

/// The WeCom client runtime
#[async_trait]
pub trait WecomBridge: Send + Sync + 'static {
    async fn register(&self, config: RegisterConfig) -> Result<()>;
    async fn select_enterprise_contact(&self, options: &ContactOptions) -> Result<Value>;
    async fn open_enterprise_chat(&self, options: &ChatOptions) -> Result<Value>;
    async fn get_location(&self, options: &LocationOptions) -> Result<Value>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMode {
    Single,
    #[default]
    Multi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Department,
    User,
}

/// Options for the enterprise contact picker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactOptions {
    pub from_department_id: i64,
    pub mode: ContactMode,
    #[serde(rename = "type")]
    pub types: Vec<ContactType>,
    pub selected_department_ids: Vec<String>,
    pub selected_user_ids: Vec<String>,
}

impl Default for ContactOptions {
    fn default() -> Self {
        Self {
            from_department_id: 0,
            mode: ContactMode::Multi,
            types: vec![ContactType::Department, ContactType::User],
            selected_department_ids: Vec::new(),
            selected_user_ids: Vec::new(),
        }
    }
}

/// Options for opening a chat; needs user ids or a chat id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl ChatOptions {
    pub fn with_users<S: Into<String>>(user_ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            user_ids: user_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_chat(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let has_users = self.user_ids.iter().any(|id| !id.trim().is_empty());
        let has_chat = self.chat_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if has_users || has_chat {
            Ok(())
        } else {
            Err(Error::invalid("open_enterprise_chat needs user_ids or chat_id"))
        }
    }
}

/// Coordinate system for reported locations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    #[default]
    Wgs84,
    Gcj02,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationOptions {
    #[serde(rename = "type")]
    pub kind: LocationType,
}

/// Registers the page with WeCom
pub struct WecomLoader {
    signatures: Arc<dyn SignatureSource>,
    bridge: Arc<dyn WecomBridge>,
    js_api_list: Vec<String>,
    page_url: RwLock<String>,
}

impl WecomLoader {
    pub fn new(
        signatures: Arc<dyn SignatureSource>,
        bridge: Arc<dyn WecomBridge>,
        config: &WecomConfig,
    ) -> Self {
        Self {
            signatures,
            bridge,
            js_api_list: config.js_api_list.clone(),
            page_url: RwLock::new(config.page_url.clone()),
        }
    }

    /// Page URL to sign; takes effect on the next load
    pub fn set_page_url(&self, url: impl Into<String>) {
        *self.page_url.write() = url.into();
    }

    pub fn bridge(&self) -> &dyn WecomBridge {
        self.bridge.as_ref()
    }
}

#[async_trait]
impl SdkLoader for WecomLoader {
    fn name(&self) -> &str {
        "wecom"
    }

    async fn load(&self, _options: &SdkOptions) -> Result<()> {
        let page_url = self.page_url.read().clone();
        if page_url.is_empty() {
            return Err(Error::invalid("WeCom page URL is not configured"));
        }

        let signature = self.signatures.signature(&page_url).await?;
        self.bridge
            .register(RegisterConfig {
                corp_id: signature.app_id.clone(),
                js_api_list: self.js_api_list.clone(),
                signature,
            })
            .await
    }
}

/// WeCom JS-API operations behind the SDK lifecycle
#[derive(Clone, Debug)]
pub struct WecomClient {
    sdk: SdkLifecycle<WecomLoader>,
}

impl WecomClient {
    pub fn new(loader: WecomLoader, options: SdkOptions) -> Self {
        Self {
            sdk: SdkLifecycle::new(loader, options),
        }
    }

    pub fn lifecycle(&self) -> &SdkLifecycle<WecomLoader> {
        &self.sdk
    }

    /// Enterprise contact picker
    pub async fn select_enterprise_contact(&self, options: &ContactOptions) -> Result<Value> {
        self.sdk
            .guarded("select enterprise contact", |loader| {
                loader.bridge().select_enterprise_contact(options)
            })
            .await
    }

    /// Open a 1:1 or group chat
    ///
    /// Options are validated before the SDK is touched.
    pub async fn open_enterprise_chat(&self, options: &ChatOptions) -> Result<Value> {
        options.validate()?;
        self.sdk
            .guarded("open enterprise chat", |loader| {
                loader.bridge().open_enterprise_chat(options)
            })
            .await
    }

    /// Current device location
    pub async fn get_location(&self, options: &LocationOptions) -> Result<Value> {
        self.sdk
            .guarded("get location", |loader| loader.bridge().get_location(options))
            .await
    }
}

/// Runtime the page is hosted in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Wecom,
    Wechat,
    Browser,
}

impl Environment {
    /// Classify a user agent string
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("wxwork") {
            Self::Wecom
        } else if ua.contains("micromessenger") {
            Self::Wechat
        } else {
            Self::Browser
        }
    }

    pub fn is_wecom(self) -> bool {
        self == Self::Wecom
    }
}
