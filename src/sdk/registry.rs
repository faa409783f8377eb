//! SDK Registry
//!
//! Owns the Tencent Map and WeCom lifecycles for the whole application and
//! brings both up in parallel at startup.

use crate::api::WecomApi;
use crate::config::AppConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::sdk::{
    MapRenderer, MapView, ScriptHost, SdkLifecycle, SdkOverrides, TencentMapLoader, WecomBridge,
    WecomClient, WecomLoader,
};
use std::sync::Arc;

/// Outcome of [`SdkRegistry::bootstrap`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootstrapReport {
    pub map: bool,
    pub wecom: bool,
}

impl BootstrapReport {
    pub fn all_ready(&self) -> bool {
        self.map && self.wecom
    }
}

/// Application-wide SDK instances
#[derive(Clone, Debug)]
pub struct SdkRegistry {
    map: SdkLifecycle<TencentMapLoader>,
    wecom: WecomClient,
}

impl SdkRegistry {
    pub fn new(map: SdkLifecycle<TencentMapLoader>, wecom: WecomClient) -> Self {
        Self { map, wecom }
    }

    /// Wire both SDKs from configuration
    pub fn from_config(
        config: &AppConfig,
        http: HttpClient,
        scripts: Arc<dyn ScriptHost>,
        bridge: Arc<dyn WecomBridge>,
    ) -> Result<Self> {
        let options = config.sdk.options()?;

        let map = SdkLifecycle::new(TencentMapLoader::new(scripts, &config.map), options.clone());

        let signatures = Arc::new(WecomApi::new(http, config.wecom.signature_path.clone()));
        let wecom = WecomClient::new(WecomLoader::new(signatures, bridge, &config.wecom), options);

        Ok(Self::new(map, wecom))
    }

    /// Initialize both SDKs concurrently
    ///
    /// Never fails; a failed SDK is reported and can be retried later through
    /// its own guard.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let none = SdkOverrides::none();
        let (map, wecom) = tokio::join!(self.map.init(&none), self.wecom.lifecycle().init(&none));

        let report = BootstrapReport { map, wecom };
        if report.all_ready() {
            tracing::info!("SDK bootstrap complete");
        } else {
            tracing::warn!("SDK bootstrap incomplete: map={} wecom={}", map, wecom);
        }
        report
    }

    pub fn map(&self) -> &SdkLifecycle<TencentMapLoader> {
        &self.map
    }

    pub fn wecom(&self) -> &WecomClient {
        &self.wecom
    }

    /// New map view bound to the shared map SDK
    pub fn map_view(&self, renderer: Arc<dyn MapRenderer>, container_id: impl Into<String>) -> MapView {
        MapView::new(self.map.clone(), renderer, container_id)
    }
}
