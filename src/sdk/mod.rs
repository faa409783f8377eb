//! Third-party SDKs
//!
//! Every external SDK is brought up through an [`SdkLifecycle`], which
//! de-duplicates concurrent initialization, retries with backoff and guards
//! dependent operations.

mod headless;
mod lifecycle;
mod loader;
mod map;
mod registry;
mod script;
mod wecom;

pub use crate::config::{SdkOptions, SdkOverrides};
pub use headless::*;
pub use lifecycle::*;
pub use loader::*;
pub use map::*;
pub use registry::*;
pub use script::*;
pub use wecom::*;
