/// Centralized error types for the Kite bridge
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // Authentication Errors
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Missing enctoken: an authenticated call requires a non-empty token")]
    MissingToken,

    #[error("TOTP generation failed: {0}")]
    TotpError(String),

    // Network Errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Upstream API Errors
    #[error("Kite API error ({status}): {message}")]
    KiteApiError { status: u16, message: String },

    // Data Errors
    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    // Validation Errors
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// True when the caller supplied bad input, as opposed to an
    /// upstream or internal failure
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidParameter(_)
                | BridgeError::MissingToken
                | BridgeError::AuthenticationFailed(_)
        )
    }

    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            BridgeError::AuthenticationFailed(_) => "AUTH_001",
            BridgeError::MissingToken => "AUTH_002",
            BridgeError::TotpError(_) => "AUTH_003",
            BridgeError::HttpError(_) => "NET_001",
            BridgeError::KiteApiError { .. } => "KITE_001",
            BridgeError::ParseError(_) => "DATA_001",
            BridgeError::DeserializationError(_) => "DATA_002",
            BridgeError::InvalidParameter(_) => "CFG_002",
            BridgeError::ConfigError(_) => "CFG_001",
            BridgeError::FileError(_) => "FILE_001",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            BridgeError::AuthenticationFailed("bad".to_string()).error_code(),
            "AUTH_001"
        );
        assert_eq!(BridgeError::MissingToken.error_code(), "AUTH_002");
        assert_eq!(
            BridgeError::KiteApiError {
                status: 403,
                message: "forbidden".to_string()
            }
            .error_code(),
            "KITE_001"
        );
    }

    #[test]
    fn test_client_fault_classification() {
        assert!(BridgeError::MissingToken.is_client_fault());
        assert!(BridgeError::InvalidParameter("order_id".to_string()).is_client_fault());
        assert!(!BridgeError::ParseError("bad row".to_string()).is_client_fault());
        assert!(!BridgeError::KiteApiError {
            status: 500,
            message: "oops".to_string()
        }
        .is_client_fault());
    }

    #[test]
    fn test_display_includes_upstream_status() {
        let err = BridgeError::KiteApiError {
            status: 403,
            message: "Incorrect `api_key` or `access_token`".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("access_token"));
    }
}
