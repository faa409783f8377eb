//! Config - Application Configuration
//!
//! Read once at startup from `config.toml`, then patched from environment
//! variables. Values are handed to the engines as plain data.

use crate::config::{SdkOptions, SdkOverrides};
use crate::constants::{
    DEFAULT_API_URL, DEFAULT_PAGE_SIZE, ENV_API_URL, ENV_MAP_KEY, ENV_PAGE_URL, ENV_ROUTER_MODE,
    HTTP_SUCCESS_CODE, HTTP_TIMEOUT_MS, RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_MS,
    RETRY_MULTIPLIER, SDK_MAX_RETRIES, SDK_TIMEOUT_MS, TENCENT_MAP_SCRIPT_URL,
    WECOM_JS_API_LIST, WECOM_SIGNATURE_PATH,
};
use crate::error::{Error, Result};
use crate::helpers::{BackoffConfig, default_config_path};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Backend API
    pub api: ApiConfig,
    /// Tencent Map SDK
    pub map: MapConfig,
    /// WeCom JS-SDK
    pub wecom: WecomConfig,
    /// Shared SDK lifecycle settings
    pub sdk: SdkConfig,
    /// Paginated lists
    pub list: ListConfig,
    /// Logging
    pub log: LogConfig,
    /// Router mode of the hosting shell
    pub router_mode: RouterMode,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Envelope `code`/`status` value that means success
    pub success_code: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_ms: HTTP_TIMEOUT_MS,
            success_code: HTTP_SUCCESS_CODE.to_string(),
        }
    }
}

/// Tencent Map configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Developer key
    pub key: String,
    /// GL script endpoint
    pub script_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            script_url: TENCENT_MAP_SCRIPT_URL.to_string(),
        }
    }
}

/// WeCom configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WecomConfig {
    /// Signature endpoint, relative to `api.base_url`
    pub signature_path: String,
    /// JS-APIs to register
    pub js_api_list: Vec<String>,
    /// URL of the hosting page (signed by the backend)
    pub page_url: String,
}

impl Default for WecomConfig {
    fn default() -> Self {
        Self {
            signature_path: WECOM_SIGNATURE_PATH.to_string(),
            js_api_list: WECOM_JS_API_LIST.iter().map(|s| s.to_string()).collect(),
            page_url: String::new(),
        }
    }
}

/// Instance-level SDK lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SdkConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_multiplier: f64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: SDK_TIMEOUT_MS,
            max_retries: SDK_MAX_RETRIES,
            retry_initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            retry_max_delay_ms: RETRY_MAX_DELAY_MS,
            retry_multiplier: RETRY_MULTIPLIER,
        }
    }
}

impl SdkConfig {
    /// Instance-level overrides described by this section
    pub fn overrides(&self) -> SdkOverrides {
        SdkOverrides::none()
            .timeout(Duration::from_millis(self.timeout_ms))
            .max_retries(self.max_retries)
            .backoff(BackoffConfig {
                initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
                multiplier: self.retry_multiplier,
            })
    }

    /// Resolve against the built-in defaults
    pub fn options(&self) -> Result<SdkOptions> {
        SdkOptions::default().merged(&self.overrides())
    }
}

/// Paginated list configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for daily rolling log files (stdout only when unset)
    pub dir: Option<String>,
    /// Default filter directive, e.g. "info" or "fieldops=debug"
    pub level: Option<String>,
}

/// Router mode of the hosting shell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    #[default]
    Hash,
    History,
}

impl FromStr for RouterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(RouterMode::Hash),
            "history" => Ok(RouterMode::History),
            other => Err(Error::Invalid {
                message: format!("Unknown router mode: {other}"),
            }),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults. Environment overrides are applied
    /// and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let mut config = if path.exists() {
            info!("Loading config file: {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(key) = lookup(ENV_MAP_KEY) {
            self.map.key = key;
        }
        if let Some(page_url) = lookup(ENV_PAGE_URL) {
            self.wecom.page_url = page_url;
        }
        if let Some(mode) = lookup(ENV_ROUTER_MODE) {
            self.router_mode = mode.parse()?;
        }
        Ok(())
    }

    /// Reject values the engines cannot run with
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| Error::Invalid {
            message: format!("Invalid api.base_url '{}': {e}", self.api.base_url),
        })?;

        if self.list.page_size == 0 {
            return Err(Error::invalid("list.page_size must be greater than zero"));
        }

        self.sdk.overrides().validate()
    }
}
