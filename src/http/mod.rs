//! HTTP Layer
//!
//! Backend access for the API modules: token injection, envelope checking,
//! failure notices and the loading indicator for the hosting UI.

mod client;
mod envelope;
mod loading;
mod notice;
mod session;

pub use client::*;
pub use envelope::*;
pub use loading::*;
pub use notice::*;
pub use session::*;
