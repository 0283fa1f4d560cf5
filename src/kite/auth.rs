/// Kite web login
///
/// Two-step credential exchange against the interactive login
/// endpoints: a password step that returns a request id, then a
/// two-factor step that sets the `enctoken` cookie on the shared
/// session. The cookie value is the bearer credential for every
/// subsequent OMS call.
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::types::Config;

const ENCTOKEN_COOKIE: &str = "enctoken";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: Option<LoginData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    request_id: String,
    user_id: String,
}

/// Second factor for the two-factor step
#[derive(Debug, Clone)]
pub enum TwoFactor {
    /// A code the caller already holds (authenticator app or SMS OTP)
    Code(String),
    /// A base32 TOTP secret; the current code is derived at call time
    TotpSecret(String),
}

pub struct Authenticator {
    client: Client,
    auth_root: String,
}

impl Authenticator {
    pub fn new(config: &Config) -> Result<Self> {
        // The cookie store carries the login session between the two steps
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Authenticator {
            client,
            auth_root: config.auth_root.clone(),
        })
    }

    /// Run the two-step handshake and return the enctoken
    pub async fn authenticate(
        &self,
        user_id: &str,
        password: &str,
        two_factor: TwoFactor,
    ) -> Result<String> {
        debug!("Starting Kite login for {}", user_id);

        let response = self
            .client
            .post(format!("{}/api/login", self.auth_root))
            .form(&[("user_id", user_id), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Login step returned {}", status);

        let login: LoginResponse = serde_json::from_str(&body).map_err(|_| {
            BridgeError::AuthenticationFailed(format!(
                "Login endpoint returned an unexpected response (HTTP {})",
                status.as_u16()
            ))
        })?;

        let data = login.data.ok_or_else(|| {
            BridgeError::AuthenticationFailed(
                login
                    .message
                    .unwrap_or_else(|| "Invalid credentials".to_string()),
            )
        })?;

        let twofa_value = match two_factor {
            TwoFactor::Code(code) => code,
            TwoFactor::TotpSecret(secret) => generate_totp(&secret)?,
        };

        let response = self
            .client
            .post(format!("{}/api/twofa", self.auth_root))
            .form(&[
                ("request_id", data.request_id.as_str()),
                ("twofa_value", twofa_value.as_str()),
                ("user_id", data.user_id.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let token = response
            .cookies()
            .find(|cookie| cookie.name() == ENCTOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string());
        debug!("Two-factor step returned {}", status);

        match token {
            Some(token) if !token.is_empty() => {
                info!("✅ Kite login successful for {}", data.user_id);
                Ok(token)
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<LoginResponse>(&body)
                    .ok()
                    .and_then(|r| r.message)
                    .unwrap_or_else(|| "Invalid credentials".to_string());
                Err(BridgeError::AuthenticationFailed(message))
            }
        }
    }
}

/// Generate an RFC 6238 TOTP code (SHA-1, 30 second step, 6 digits)
pub fn generate_totp(secret: &str) -> Result<String> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let key = decode_secret(secret)?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BridgeError::TotpError(format!("System clock error: {}", e)))?
        .as_secs();

    totp_at(&key, timestamp / 30)
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    base32::decode(
        base32::Alphabet::RFC4648 { padding: false },
        secret.trim(),
    )
    .ok_or_else(|| BridgeError::TotpError("Invalid base32 TOTP secret".to_string()))
}

fn totp_at(key: &[u8], time_step: u64) -> Result<String> {
    use hmac::{Hmac, Mac};
    use sha1::Sha1;

    type HmacSha1 = Hmac<Sha1>;

    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| BridgeError::TotpError(format!("HMAC error: {}", e)))?;
    mac.update(&time_step.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    // Dynamic truncation
    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        hash[offset] & 0x7f,
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]);

    Ok(format!("{:06}", code % 1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use axum::http::StatusCode;
    use axum::response::AppendHeaders;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    type FieldLog = Arc<Mutex<Vec<(String, String)>>>;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config_for(auth_root: &str) -> Config {
        Config {
            auth_root: auth_root.to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_two_step_login_yields_cookie_value() {
        let login_fields: FieldLog = Arc::new(Mutex::new(Vec::new()));
        let twofa_fields: FieldLog = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/api/login",
                post({
                    let log = login_fields.clone();
                    move |Form(fields): Form<Vec<(String, String)>>| {
                        let log = log.clone();
                        async move {
                            log.lock().await.extend(fields);
                            Json(json!({
                                "status": "success",
                                "data": {"request_id": "req-77", "user_id": "AB1234"}
                            }))
                        }
                    }
                }),
            )
            .route(
                "/api/twofa",
                post({
                    let log = twofa_fields.clone();
                    move |Form(fields): Form<Vec<(String, String)>>| {
                        let log = log.clone();
                        async move {
                            log.lock().await.extend(fields);
                            (
                                AppendHeaders([(SET_COOKIE, "enctoken=tok-abc123; Path=/")]),
                                Json(json!({"status": "success", "data": {}})),
                            )
                        }
                    }
                }),
            );

        let root = spawn(app).await;
        let auth = Authenticator::new(&config_for(&root)).unwrap();
        let token = auth
            .authenticate("ab1234", "hunter2", TwoFactor::Code("123456".to_string()))
            .await
            .unwrap();
        assert_eq!(token, "tok-abc123");

        let login_seen = login_fields.lock().await;
        assert!(login_seen.contains(&("user_id".to_string(), "ab1234".to_string())));
        assert!(login_seen.contains(&("password".to_string(), "hunter2".to_string())));

        // Step 2 forwards the ids the login step handed back, not the caller's
        let twofa_seen = twofa_fields.lock().await;
        assert!(twofa_seen.contains(&("request_id".to_string(), "req-77".to_string())));
        assert!(twofa_seen.contains(&("twofa_value".to_string(), "123456".to_string())));
        assert!(twofa_seen.contains(&("user_id".to_string(), "AB1234".to_string())));
    }

    #[tokio::test]
    async fn test_rejected_password_step_stops_before_twofa() {
        let twofa_calls = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route(
                "/api/login",
                post(|| async {
                    (
                        StatusCode::FORBIDDEN,
                        Json(json!({"status": "error", "message": "Invalid username or password"})),
                    )
                }),
            )
            .route(
                "/api/twofa",
                post({
                    let calls = twofa_calls.clone();
                    move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { "ok" }
                    }
                }),
            );

        let root = spawn(app).await;
        let auth = Authenticator::new(&config_for(&root)).unwrap();
        let err = auth
            .authenticate("ab1234", "wrong", TwoFactor::Code("123456".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::AuthenticationFailed(_)));
        assert!(err.to_string().contains("Invalid username or password"));
        assert_eq!(twofa_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_cookie_fails_authentication() {
        let app = Router::new()
            .route(
                "/api/login",
                post(|| async {
                    Json(json!({
                        "status": "success",
                        "data": {"request_id": "req-1", "user_id": "AB1234"}
                    }))
                }),
            )
            .route(
                "/api/twofa",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"status": "error", "message": "Invalid TOTP"})),
                    )
                }),
            );

        let root = spawn(app).await;
        let auth = Authenticator::new(&config_for(&root)).unwrap();
        let err = auth
            .authenticate("ab1234", "hunter2", TwoFactor::Code("000000".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::AuthenticationFailed(_)));
        assert!(err.to_string().contains("Invalid TOTP"));
    }

    #[test]
    fn test_totp_rfc6238_sha1_vector() {
        // RFC 6238 appendix B, T=59 with the ASCII secret
        // "12345678901234567890"; the 8-digit vector is 94287082
        let key = decode_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
        assert_eq!(totp_at(&key, 59 / 30).unwrap(), "287082");
    }

    #[test]
    fn test_totp_rejects_invalid_secret() {
        let err = generate_totp("not base32 !!!").unwrap_err();
        assert!(matches!(err, BridgeError::TotpError(_)));
    }

    #[test]
    fn test_totp_code_is_six_digits() {
        let key = decode_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
        for step in [0u64, 1, 2, 1_000_000, u64::MAX / 30] {
            let code = totp_at(&key, step).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
