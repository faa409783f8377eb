//! State - Selection and Session Stores
//!
//! Plain data holders shared between screens. They never talk to the
//! network themselves except through an API handle passed in.

mod organization;
mod user;

pub use organization::*;
pub use user::*;
