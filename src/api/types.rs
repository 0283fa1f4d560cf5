/// Request and response types for the HTTP layer
use serde::{Deserialize, Serialize};

/// Placeholder payload for responses that carry no data
#[derive(Debug, Clone, Serialize)]
pub struct Empty {}

/// Standard response envelope
///
/// Every route answers with this shape. `status` is "success" or
/// "error"; the optional fields appear only when they carry a value.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enctoken: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_data(data: T) -> Self {
        ApiResponse {
            status: "success".to_string(),
            message: None,
            data: Some(data),
            order_id: None,
            enctoken: None,
        }
    }

    pub fn success_with_order_id(order_id: &str) -> Self {
        ApiResponse {
            status: "success".to_string(),
            message: None,
            data: None,
            order_id: Some(order_id.to_string()),
            enctoken: None,
        }
    }

    pub fn success_with_message(message: &str) -> Self {
        ApiResponse {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
            order_id: None,
            enctoken: None,
        }
    }

    /// Login answer: fixed message plus the raw token for the caller
    pub fn login_success(enctoken: &str) -> Self {
        ApiResponse {
            status: "success".to_string(),
            message: Some("Login successful".to_string()),
            data: None,
            order_id: None,
            enctoken: Some(enctoken.to_string()),
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            status: "error".to_string(),
            message: Some(message.to_string()),
            data: None,
            order_id: None,
            enctoken: None,
        }
    }
}

/// Body of POST /login
///
/// Exactly one of `twofa` (a ready six-digit code) or `twofa_secret`
/// (a base32 TOTP seed the bridge turns into a code) must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "userid")]
    pub user_id: String,
    pub password: String,
    pub twofa: Option<String>,
    pub twofa_secret: Option<String>,
}

/// Query string of GET /instruments
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentsQuery {
    pub exchange: Option<String>,
}

/// Query string of GET /historical-data
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalDataQuery {
    pub instrument_token: i64,
    pub from_date: String,
    pub to_date: String,
    pub interval: String,
    /// Ask Kite to include open interest (0 or 1, defaults off)
    pub oi: Option<u8>,
}
