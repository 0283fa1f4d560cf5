/// Fetch a fresh enctoken from the command line
/// Usage: KITE_USER_ID=AB1234 KITE_PASSWORD=... KITE_TWOFA=123456 cargo run --bin fetch_enctoken
///
/// Set KITE_TOTP_SECRET instead of KITE_TWOFA to have the code
/// generated from an authenticator seed.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kitebridge::config::load_config;
use kitebridge::kite::{Authenticator, TwoFactor};
use kitebridge::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let user_id = std::env::var("KITE_USER_ID").context("KITE_USER_ID must be set")?;
    let password = std::env::var("KITE_PASSWORD").context("KITE_PASSWORD must be set")?;

    let two_factor = if let Ok(code) = std::env::var("KITE_TWOFA") {
        TwoFactor::Code(code)
    } else if let Ok(secret) = std::env::var("KITE_TOTP_SECRET") {
        TwoFactor::TotpSecret(secret)
    } else {
        bail!("Set KITE_TWOFA (a ready code) or KITE_TOTP_SECRET (an authenticator seed)");
    };

    let config = match load_config("config.toml") {
        Ok(config) => config,
        Err(_) => {
            info!("No usable config.toml, falling back to production endpoints");
            Config::default()
        }
    };

    info!("🔑 Logging in as {}...", user_id);
    let authenticator = Authenticator::new(&config)?;
    let enctoken = authenticator
        .authenticate(&user_id, &password, two_factor)
        .await?;
    info!("✅ Login successful");

    // The bare token goes to stdout so it can be piped
    println!("{}", enctoken);
    Ok(())
}
