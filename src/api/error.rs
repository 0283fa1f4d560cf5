/// HTTP-facing error mapping
///
/// Translates bridge errors into status codes and the standard JSON
/// envelope without leaking internals to clients.
use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::types::{ApiResponse, Empty};
use crate::error::BridgeError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable enctoken in session or header (401)
    #[error("Missing or invalid enctoken")]
    MissingToken,

    /// Credentials rejected upstream (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Caller-supplied input was unusable (400)
    #[error("{0}")]
    BadRequest(String),

    /// Kite rejected or mangled the forwarded call (502)
    #[error("{0}")]
    Upstream(String),

    /// Anything the caller cannot fix (500)
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Missing or invalid enctoken".to_string())
            }
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(message) => {
                // Log the detail, answer with a generic line
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<Empty>::error(&message))).into_response()
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        if err.is_client_fault() {
            debug!("Request failed: {} ({})", err, err.error_code());
        } else {
            warn!("Bridged call failed: {} ({})", err, err.error_code());
        }
        match err {
            BridgeError::AuthenticationFailed(message) => ApiError::Unauthorized(message),
            BridgeError::MissingToken => ApiError::MissingToken,
            BridgeError::InvalidParameter(message) => ApiError::BadRequest(message),
            BridgeError::TotpError(message) => ApiError::BadRequest(message),
            BridgeError::KiteApiError { status, message } => {
                ApiError::Upstream(format!("Kite returned {}: {}", status, message))
            }
            BridgeError::HttpError(e) => ApiError::Upstream(format!("Upstream call failed: {}", e)),
            BridgeError::ParseError(message) => {
                ApiError::Upstream(format!("Upstream response unusable: {}", message))
            }
            BridgeError::DeserializationError(e) => ApiError::Internal(e.to_string()),
            BridgeError::ConfigError(message) => ApiError::Internal(message),
            BridgeError::FileError(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// `Json` extractor whose rejection answers in the standard envelope.
///
/// The stock extractor rejects malformed bodies with plain-text
/// responses; routing the rejection through `ApiError` keeps every
/// answer on the wire in envelope shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// `Query` extractor whose rejection answers in the standard envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}
