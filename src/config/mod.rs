//! Configuration
//!
//! Application configuration file and layered SDK options.

mod app;
mod sdk;

pub use app::*;
pub use sdk::*;
