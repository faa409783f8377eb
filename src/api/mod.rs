//! API Modules
//!
//! Typed wrappers over backend REST endpoints.

mod organization;
mod user;
mod wecom;

pub use organization::*;
pub use user::*;
pub use wecom::*;
