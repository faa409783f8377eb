//! Fieldops Client Core
//!
//! Headless core of the field operations mobile client: a paginated list
//! engine over the backend's paged endpoints, and a lifecycle manager that
//! brings third-party SDKs (Tencent Map, WeCom) up once, with retry and
//! timeouts, before any dependent operation runs. Camera capture, face
//! recognition and photo compression sit alongside.

pub mod api;
pub mod camera;
pub mod compress;
pub mod config;
pub mod constants;
pub mod error;
pub mod face;
pub mod helpers;
pub mod http;
pub mod list;
pub mod sdk;
pub mod state;
