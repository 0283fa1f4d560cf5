// The swagger document in api::docs nests past the default macro
// recursion depth.
#![recursion_limit = "256"]

pub mod types;
pub mod error;
pub mod kite;
pub mod api;
pub mod config;

pub use types::*;
pub use error::{BridgeError, Result};
