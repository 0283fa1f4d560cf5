/// Route handlers for the bridge API
///
/// Every Kite-facing handler builds a fresh `KiteClient` around the
/// token the session middleware resolved, forwards one call, and wraps
/// the answer in the standard envelope.
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use serde_json::Value;
use tracing::info;

use crate::api::docs;
use crate::api::error::{ApiError, ApiJson, ApiQuery};
use crate::api::session::{self, ResolvedToken, SessionStore};
use crate::api::types::{
    ApiResponse, Empty, HistoricalDataQuery, InstrumentsQuery, LoginRequest,
};
use crate::kite::{Authenticator, KiteClient, TwoFactor};
use crate::types::{
    Candle, Config, Exchange, Instrument, OrderCancellation, OrderModification, OrderParams,
};

/// Shared state handed to every handler
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let sessions = SessionStore::new(config.session_ttl_hours);
        AppState { config, sessions }
    }
}

pub async fn health() -> Json<ApiResponse<Empty>> {
    Json(ApiResponse::success_with_message("ok"))
}

pub async fn swagger() -> Json<Value> {
    Json(docs::swagger_document())
}

/// POST /login: run the two-step Kite login and seed a session.
///
/// The raw enctoken is echoed in the response for callers that prefer
/// to manage it themselves via the X-Enctoken header.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let two_factor = if let Some(code) = request.twofa.clone() {
        TwoFactor::Code(code)
    } else if let Some(secret) = request.twofa_secret.clone() {
        TwoFactor::TotpSecret(secret)
    } else {
        return Err(ApiError::BadRequest(
            "Either twofa or twofa_secret is required".to_string(),
        ));
    };

    let authenticator = Authenticator::new(&state.config)?;
    let enctoken = authenticator
        .authenticate(&request.user_id, &request.password, two_factor)
        .await?;

    let session_id = state.sessions.insert(enctoken.clone()).await;
    let cookie = session::session_cookie(&session_id, state.config.session_ttl_hours);
    info!("🔓 Login successful for {}", request.user_id);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::<Empty>::login_success(&enctoken)),
    ))
}

pub async fn instruments(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    ApiQuery(query): ApiQuery<InstrumentsQuery>,
) -> Result<Json<ApiResponse<Vec<Instrument>>>, ApiError> {
    let exchange = match query.exchange.as_deref() {
        None => None,
        Some(raw) => Some(
            Exchange::from_str(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown exchange: {}", raw)))?,
        ),
    };

    let kite = KiteClient::new(&token.0, &state.config).await?;
    let instruments = kite.instruments(exchange).await?;
    Ok(Json(ApiResponse::success_with_data(instruments)))
}

pub async fn historical_data(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    ApiQuery(query): ApiQuery<HistoricalDataQuery>,
) -> Result<Json<ApiResponse<Vec<Candle>>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let candles = kite
        .historical_candles(
            query.instrument_token,
            &query.from_date,
            &query.to_date,
            &query.interval,
            query.oi.unwrap_or(0) != 0,
        )
        .await?;
    Ok(Json(ApiResponse::success_with_data(candles)))
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let keys = instrument_keys(query.as_deref());
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let quotes = kite.quote(&keys).await?;
    Ok(Json(ApiResponse::success_with_data(quotes)))
}

pub async fn ltp(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let keys = instrument_keys(query.as_deref());
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let prices = kite.ltp(&keys).await?;
    Ok(Json(ApiResponse::success_with_data(prices)))
}

pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    ApiJson(params): ApiJson<OrderParams>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let order_id = kite.place_order(&params).await?;
    Ok(Json(ApiResponse::success_with_order_id(&order_id)))
}

pub async fn modify_order(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    ApiJson(params): ApiJson<OrderModification>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let order_id = kite.modify_order(&params).await?;
    Ok(Json(ApiResponse::success_with_order_id(&order_id)))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
    ApiJson(params): ApiJson<OrderCancellation>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    let order_id = kite.cancel_order(&params).await?;
    Ok(Json(ApiResponse::success_with_order_id(&order_id)))
}

pub async fn orders(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    Ok(Json(ApiResponse::success_with_data(kite.orders().await?)))
}

pub async fn positions(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    Ok(Json(ApiResponse::success_with_data(kite.positions().await?)))
}

pub async fn holdings(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    Ok(Json(ApiResponse::success_with_data(kite.holdings().await?)))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    Ok(Json(ApiResponse::success_with_data(kite.profile().await?)))
}

pub async fn margins(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<ResolvedToken>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let kite = KiteClient::new(&token.0, &state.config).await?;
    Ok(Json(ApiResponse::success_with_data(kite.margins().await?)))
}

/// Collect every `i=` value from a raw query string.
///
/// `Query<HashMap<..>>` keeps only the last repeated key, so the raw
/// string is walked instead.
fn instrument_keys(query: Option<&str>) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(key, _)| key == "i")
        .map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_keys_collects_repeats() {
        let keys = instrument_keys(Some("i=NSE%3AINFY&i=NSE%3ATCS"));
        assert_eq!(keys, vec!["NSE:INFY".to_string(), "NSE:TCS".to_string()]);
    }

    #[test]
    fn test_instrument_keys_ignores_other_params() {
        let keys = instrument_keys(Some("x=1&i=NSE%3AINFY&y=2"));
        assert_eq!(keys, vec!["NSE:INFY".to_string()]);
    }

    #[test]
    fn test_instrument_keys_empty_query() {
        assert!(instrument_keys(None).is_empty());
        assert!(instrument_keys(Some("")).is_empty());
    }
}
