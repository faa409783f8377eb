//! Constants
//!
//! Centralized defaults shared across the list engine, SDK lifecycle and HTTP layer.

/// Default page size for paginated lists
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Request parameter names for paged endpoints
pub const PAGE_NUM_KEY: &str = "pageNum";
pub const PAGE_SIZE_KEY: &str = "pageSize";

/// SDK lifecycle defaults
pub const SDK_TIMEOUT_MS: u64 = 10_000;
pub const SDK_MAX_RETRIES: u32 = 3;

/// Retry configuration between SDK load attempts
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// HTTP defaults
pub const HTTP_TIMEOUT_MS: u64 = 30_000;
pub const HTTP_SUCCESS_CODE: &str = "200";
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Global loading indicator: shortest time it stays visible, and its text
pub const LOADING_MIN_DISPLAY_MS: u64 = 300;
pub const LOADING_MESSAGE: &str = "Loading...";

/// Tencent Map GL script endpoint
pub const TENCENT_MAP_SCRIPT_URL: &str = "https://map.qq.com/api/gljs";

/// WeCom JS-API signature endpoint (relative to the API base URL)
pub const WECOM_SIGNATURE_PATH: &str = "wx/cp/getJsapiSignature";

/// JS-API list registered with WeCom by default
pub const WECOM_JS_API_LIST: &[&str] = &[
    "selectEnterpriseContact",
    "openEnterpriseChat",
    "getLocation",
];

/// Default map center (Beijing) and zoom
pub const MAP_DEFAULT_LAT: f64 = 39.916527;
pub const MAP_DEFAULT_LNG: f64 = 116.397128;
pub const MAP_DEFAULT_ZOOM: f64 = 14.0;

/// Rows per place search page
pub const MAP_PLACE_PAGE_SIZE: u32 = 10;

/// Camera capture defaults
pub const CAMERA_DEFAULT_WIDTH: u32 = 1280;
pub const CAMERA_DEFAULT_HEIGHT: u32 = 720;
pub const CAMERA_DEFAULT_QUALITY: f32 = 0.8;

/// Image compression defaults
pub const COMPRESS_DEFAULT_QUALITY: f32 = 0.8;
pub const COMPRESS_MAX_WIDTH: u32 = 800;
pub const COMPRESS_MAX_HEIGHT: u32 = 800;

/// Face recognition timing and retry budget
pub const FACE_INITIAL_DELAY_MS: u64 = 3_000;
pub const FACE_CAPTURE_INTERVAL_MS: u64 = 1_500;
pub const FACE_MAX_RETRY: u32 = 3;
pub const FACE_VIDEO_WIDTH: u32 = 640;
pub const FACE_VIDEO_HEIGHT: u32 = 480;

/// Environment variable overrides read at startup
pub const ENV_API_URL: &str = "FIELDOPS_API_URL";
pub const ENV_MAP_KEY: &str = "FIELDOPS_MAP_KEY";
pub const ENV_PAGE_URL: &str = "FIELDOPS_PAGE_URL";
pub const ENV_ROUTER_MODE: &str = "FIELDOPS_ROUTER_MODE";
