/// HTTP layer: routing, sessions, envelopes and error mapping
pub mod docs;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;
pub mod types;

pub use error::{ApiError, ApiJson, ApiQuery};
pub use server::ApiServer;
pub use session::{ResolvedToken, SessionStore};
