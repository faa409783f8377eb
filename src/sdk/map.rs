//! Tencent Map SDK
//!
//! [`TencentMapLoader`] loads the GL script through a [`ScriptHost`];
//! [`MapView`] drives one map instance through a [`MapRenderer`], and runs
//! geocoding and place search against the loaded SDK services.

use crate::config::{MapConfig, SdkOptions};
use crate::constants::{MAP_DEFAULT_LAT, MAP_DEFAULT_LNG, MAP_DEFAULT_ZOOM, MAP_PLACE_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::sdk::{ScriptHost, SdkLifecycle, SdkLoader, load_script};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// Loads the Tencent Map GL script
pub struct TencentMapLoader {
    host: Arc<dyn ScriptHost>,
    script_url: String,
    key: RwLock<String>,
}

impl TencentMapLoader {
    pub fn new(host: Arc<dyn ScriptHost>, config: &MapConfig) -> Self {
        Self {
            host,
            script_url: config.script_url.clone(),
            key: RwLock::new(config.key.clone()),
        }
    }

    /// Replace the API key; takes effect on the next load after `reset`
    pub fn set_key(&self, key: impl Into<String>) {
        *self.key.write() = key.into();
    }

    /// Script URL for the current key
    pub fn script_src(&self) -> Result<String> {
        let key = self.key.read().clone();
        if key.trim().is_empty() {
            return Err(Error::invalid("Tencent Map key is not configured"));
        }

        let url = Url::parse_with_params(&self.script_url, [("v", "1.exp"), ("key", key.as_str())])
            .map_err(|e| Error::Invalid {
                message: format!("Invalid map script URL '{}': {e}", self.script_url),
            })?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl SdkLoader for TencentMapLoader {
    fn name(&self) -> &str {
        "tencent-map"
    }

    async fn load(&self, _options: &SdkOptions) -> Result<()> {
        let src = self.script_src()?;
        load_script(self.host.as_ref(), &src).await
    }
}

/// Geographic position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Rectangle given by its south-west and north-east corners
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub sw: LatLng,
    pub ne: LatLng,
}

/// A reverse-geocoded address
#[derive(Clone, Debug, PartialEq)]
pub struct Address {
    /// Plain address as returned by the service
    pub address: String,
    /// Recommended display form, falling back to `address`
    pub formatted_address: String,
    /// Province/city/district/street breakdown
    pub components: Value,
}

/// A place search hit
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    pub location: Option<LatLng>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of place search results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaceSearch {
    pub places: Vec<Place>,
    /// Total hits reported by the service
    pub count: u64,
}

/// Raw service reply; `status` 0 means success
#[derive(Debug, Deserialize)]
struct ServiceReply {
    status: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    count: u64,
}

impl ServiceReply {
    fn parse(operation: &str, raw: Value) -> Result<Self> {
        serde_json::from_value(raw).map_err(|e| Error::MalformedResponse {
            message: format!("{operation} reply: {e}"),
        })
    }

    fn is_ok(&self, operation: &str) -> bool {
        if self.status != 0 {
            tracing::debug!("{operation} returned status {}: {}", self.status, self.message);
        }
        self.status == 0
    }
}

fn decode_part<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::MalformedResponse {
        message: format!("{operation} reply: {e}"),
    })
}

#[derive(Deserialize)]
struct GeocodeResult {
    location: Option<LatLng>,
}

#[derive(Deserialize)]
struct ReverseGeocodeResult {
    #[serde(default)]
    address: String,
    #[serde(default)]
    formatted_addresses: Option<FormattedAddresses>,
    #[serde(default)]
    address_component: Value,
}

#[derive(Deserialize)]
struct FormattedAddresses {
    recommend: Option<String>,
}

/// Map construction options
///
/// Start from `MapOptions::default()` and override with struct update syntax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub rotation: f64,
    pub draggable: bool,
    pub scrollable: bool,
    pub rotatable: bool,
    pub pitchable: bool,
    pub touch_zoomable: bool,
    pub double_click_zoom: bool,
    pub show_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: LatLng::new(MAP_DEFAULT_LAT, MAP_DEFAULT_LNG),
            zoom: MAP_DEFAULT_ZOOM,
            min_zoom: 10.0,
            max_zoom: 20.0,
            pitch: 30.0,
            rotation: 0.0,
            draggable: true,
            scrollable: true,
            rotatable: false,
            pitchable: false,
            touch_zoomable: true,
            double_click_zoom: false,
            show_control: false,
        }
    }
}

/// Marker icon geometry
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub width: u32,
    pub height: u32,
    pub anchor_x: u32,
    pub anchor_y: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            width: 25,
            height: 35,
            anchor_x: 16,
            anchor_y: 32,
        }
    }
}

/// Opaque map instance id issued by a renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapHandle(pub u64);

/// Drawing surface and location services backed by the loaded SDK
///
/// Service calls return the SDK's raw reply (`status`, `result`, `data`,
/// `count`); [`MapView`] interprets it.
#[async_trait]
pub trait MapRenderer: Send + Sync + 'static {
    fn has_container(&self, container_id: &str) -> bool;
    fn create_map(&self, container_id: &str, options: &MapOptions) -> Result<MapHandle>;
    /// Place the single marker layer, or move it if present
    fn set_marker(&self, map: MapHandle, position: LatLng, style: &MarkerStyle) -> Result<()>;
    fn remove_marker(&self, map: MapHandle) -> Result<()>;

    /// `Geocoder.getLocation`
    async fn geocode(&self, address: &str) -> Result<Value>;
    /// `Geocoder.getAddress`
    async fn reverse_geocode(&self, position: LatLng) -> Result<Value>;
    /// `Search.searchRectangle` with the given page size
    async fn search_places(
        &self,
        keyword: &str,
        bounds: Option<Bounds>,
        page_size: u32,
    ) -> Result<Value>;
}

type ClickCallback = Box<dyn FnMut(LatLng) + Send>;

/// One map instance with a single selectable marker
pub struct MapView {
    sdk: SdkLifecycle<TencentMapLoader>,
    renderer: Arc<dyn MapRenderer>,
    container_id: String,
    map: Option<MapHandle>,
    marker: Option<LatLng>,
    marker_style: MarkerStyle,
    on_click: Option<ClickCallback>,
}

impl MapView {
    pub fn new(
        sdk: SdkLifecycle<TencentMapLoader>,
        renderer: Arc<dyn MapRenderer>,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            sdk,
            renderer,
            container_id: container_id.into(),
            map: None,
            marker: None,
            marker_style: MarkerStyle::default(),
            on_click: None,
        }
    }

    pub fn with_marker_style(mut self, style: MarkerStyle) -> Self {
        self.marker_style = style;
        self
    }

    /// Create the map, loading the SDK first if needed
    ///
    /// Returns the existing instance when already created.
    pub async fn init_map(&mut self, options: &MapOptions) -> Result<MapHandle> {
        if let Some(map) = self.map {
            return Ok(map);
        }

        self.sdk.ensure_initialized().await?;

        if !self.renderer.has_container(&self.container_id) {
            return Err(Error::Invalid {
                message: format!("Map container not found: {}", self.container_id),
            });
        }

        let map = self.renderer.create_map(&self.container_id, options)?;
        tracing::debug!("map created in #{}", self.container_id);
        self.map = Some(map);
        Ok(map)
    }

    pub fn map(&self) -> Option<MapHandle> {
        self.map
    }

    fn require_map(&self) -> Result<MapHandle> {
        self.map
            .ok_or_else(|| Error::invalid("Map is not initialized; call init_map first"))
    }

    /// Place the marker, replacing any previous one
    pub fn add_marker(&mut self, position: LatLng) -> Result<()> {
        let map = self.require_map()?;
        if self.marker.is_some() {
            self.renderer.remove_marker(map)?;
            self.marker = None;
        }
        self.renderer.set_marker(map, position, &self.marker_style)?;
        self.marker = Some(position);
        Ok(())
    }

    /// Move the marker, adding it if absent
    pub fn update_marker_position(&mut self, position: LatLng) -> Result<()> {
        if self.marker.is_none() {
            return self.add_marker(position);
        }

        let map = self.require_map()?;
        self.renderer.set_marker(map, position, &self.marker_style)?;
        self.marker = Some(position);
        Ok(())
    }

    pub fn marker_position(&self) -> Option<LatLng> {
        self.marker
    }

    pub fn remove_marker(&mut self) -> Result<()> {
        if let (Some(map), Some(_)) = (self.map, self.marker.take()) {
            self.renderer.remove_marker(map)?;
        }
        Ok(())
    }

    /// Move the marker to each clicked position and report it to `callback`
    pub fn enable_click_select(&mut self, callback: impl FnMut(LatLng) + Send + 'static) -> Result<()> {
        self.require_map()?;
        self.on_click = Some(Box::new(callback));
        Ok(())
    }

    pub fn disable_click_select(&mut self) {
        self.on_click = None;
    }

    pub fn is_click_select_enabled(&self) -> bool {
        self.on_click.is_some()
    }

    /// Feed a map click from the renderer
    ///
    /// Ignored unless click-select is enabled.
    pub fn handle_click(&mut self, position: LatLng) -> Result<()> {
        if self.on_click.is_none() {
            return Ok(());
        }

        self.update_marker_position(position)?;
        if let Some(callback) = self.on_click.as_mut() {
            callback(position);
        }
        Ok(())
    }

    /// Resolve an address to coordinates; `None` when the service finds nothing
    pub async fn geocode(&self, address: &str) -> Result<Option<LatLng>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::invalid("Address must not be empty"));
        }

        let renderer = self.renderer.clone();
        let query = address.to_string();
        let raw = self
            .sdk
            .guarded("geocode", |_| async move { renderer.geocode(&query).await })
            .await?;

        let reply = ServiceReply::parse("geocode", raw)?;
        if !reply.is_ok("geocode") {
            return Ok(None);
        }
        let Some(result) = reply.result else {
            return Ok(None);
        };
        let result: GeocodeResult = decode_part("geocode", result)?;
        Ok(result.location)
    }

    /// Resolve coordinates to an address; `None` when the service finds nothing
    pub async fn reverse_geocode(&self, position: LatLng) -> Result<Option<Address>> {
        if !position.is_valid() {
            return Err(Error::Invalid {
                message: format!("Invalid coordinates: {},{}", position.lat, position.lng),
            });
        }

        let renderer = self.renderer.clone();
        let raw = self
            .sdk
            .guarded("reverse geocode", |_| async move {
                renderer.reverse_geocode(position).await
            })
            .await?;

        let reply = ServiceReply::parse("reverse geocode", raw)?;
        if !reply.is_ok("reverse geocode") {
            return Ok(None);
        }
        let Some(result) = reply.result else {
            return Ok(None);
        };
        let result: ReverseGeocodeResult = decode_part("reverse geocode", result)?;
        let formatted_address = result
            .formatted_addresses
            .and_then(|f| f.recommend)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| result.address.clone());

        Ok(Some(Address {
            address: result.address,
            formatted_address,
            components: result.address_component,
        }))
    }

    /// Search places by keyword, optionally within `bounds`
    ///
    /// Returns the first page; a non-zero service status yields an empty page.
    pub async fn search_places(&self, keyword: &str, bounds: Option<Bounds>) -> Result<PlaceSearch> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::invalid("Search keyword must not be empty"));
        }

        let renderer = self.renderer.clone();
        let query = keyword.to_string();
        let raw = self
            .sdk
            .guarded("place search", |_| async move {
                renderer.search_places(&query, bounds, MAP_PLACE_PAGE_SIZE).await
            })
            .await?;

        let reply = ServiceReply::parse("place search", raw)?;
        if !reply.is_ok("place search") {
            return Ok(PlaceSearch::default());
        }
        let places: Vec<Place> = match reply.data {
            Some(data) => decode_part("place search", data)?,
            None => Vec::new(),
        };
        Ok(PlaceSearch {
            places,
            count: reply.count,
        })
    }
}

impl std::fmt::Debug for MapView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("container_id", &self.container_id)
            .field("map", &self.map)
            .field("marker", &self.marker)
            .field("click_select", &self.on_click.is_some())
            .finish()
    }
}
