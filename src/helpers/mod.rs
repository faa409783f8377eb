//! Helper Utilities
//!
//! Common utilities used across the crate.

mod backoff;
mod fs;
mod params;
mod timeout;

pub use backoff::*;
pub use fs::*;
pub use params::*;
pub use timeout::*;
