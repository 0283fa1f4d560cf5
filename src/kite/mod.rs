pub mod auth;
pub mod candles;
pub mod client;
pub mod instruments;

pub use auth::{generate_totp, Authenticator, TwoFactor};
pub use client::KiteClient;
pub use instruments::parse_instrument_dump;
