//! Paginated Lists
//!
//! Incremental list loading against a server-side paged endpoint.

mod page;
mod refresh;

pub use page::*;
pub use refresh::*;
