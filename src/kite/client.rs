/// Kite trading API client
///
/// Wraps an enctoken into the OMS header scheme and exposes one method
/// per upstream operation. Every method performs a single outbound
/// call; nothing is cached or retried here.
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::kite::candles::parse_candles;
use crate::kite::instruments::parse_instrument_dump;
use crate::types::{
    Candle, Config, Exchange, Instrument, OrderCancellation, OrderModification, OrderParams,
};

const KITE_VERSION_HEADER: &str = "x-kite-version";
const KITE_VERSION: &str = "3";

/// Response envelope shared by all OMS JSON endpoints
#[derive(Debug, Deserialize)]
struct KiteEnvelope {
    data: Option<Value>,
    message: Option<String>,
    error_type: Option<String>,
}

#[derive(Debug)]
pub struct KiteClient {
    client: Client,
    oms_root: String,
    api_root: String,
}

impl KiteClient {
    /// Build a client around an enctoken and fire the warm-up request.
    ///
    /// The warm-up mirrors the browser touching the OMS root right
    /// after login. Its response is discarded and failure is not
    /// fatal; whether the call is load-bearing upstream is unknown, so
    /// it is kept.
    pub async fn new(enctoken: &str, config: &Config) -> Result<Self> {
        let client = Self::build(enctoken, config)?;
        client.warm_up().await;
        Ok(client)
    }

    fn build(enctoken: &str, config: &Config) -> Result<Self> {
        let token = enctoken.trim();
        if token.is_empty() {
            return Err(BridgeError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("enctoken {}", token))
            .map_err(|_| {
                BridgeError::InvalidParameter(
                    "enctoken contains characters not allowed in a header".to_string(),
                )
            })?;
        // Masked in Debug output; the raw token must never reach logs
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            HeaderName::from_static(KITE_VERSION_HEADER),
            HeaderValue::from_static(KITE_VERSION),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(KiteClient {
            client,
            oms_root: config.oms_root.clone(),
            api_root: config.api_root.clone(),
        })
    }

    async fn warm_up(&self) {
        match self.client.get(&self.oms_root).send().await {
            Ok(response) => debug!("Warm-up request returned {}", response.status()),
            Err(e) => debug!("Warm-up request failed (ignored): {}", e),
        }
    }

    /// Fetch and parse the full instrument dump, optionally filtered
    /// to a single exchange
    pub async fn instruments(&self, exchange: Option<Exchange>) -> Result<Vec<Instrument>> {
        let (status, body) = self
            .send(self.client.get(format!("{}/instruments", self.api_root)))
            .await?;
        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        let instruments = parse_instrument_dump(&body, exchange)?;
        info!("📥 Parsed {} instruments from dump", instruments.len());
        Ok(instruments)
    }

    /// Full quote for one or more instrument keys (`EXCHANGE:SYMBOL`)
    pub async fn quote(&self, keys: &[String]) -> Result<Value> {
        let params = instrument_key_params(keys)?;
        let (status, body) = self
            .send(
                self.client
                    .get(format!("{}/quote", self.oms_root))
                    .query(&params),
            )
            .await?;
        Self::expect_data(status, &body)
    }

    /// Last traded price for one or more instrument keys.
    ///
    /// Unlike `quote`, the upstream body comes back whole, envelope
    /// included.
    pub async fn ltp(&self, keys: &[String]) -> Result<Value> {
        let params = instrument_key_params(keys)?;
        let (status, body) = self
            .send(
                self.client
                    .get(format!("{}/quote/ltp", self.oms_root))
                    .query(&params),
            )
            .await?;
        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| BridgeError::ParseError(format!("LTP response was not JSON: {}", e)))
    }

    /// Historical candles for an instrument over a date range.
    ///
    /// A success body without `data.candles` is an empty result, not
    /// an error.
    pub async fn historical_candles(
        &self,
        instrument_token: i64,
        from_date: &str,
        to_date: &str,
        interval: &str,
        oi: bool,
    ) -> Result<Vec<Candle>> {
        if interval.trim().is_empty() {
            return Err(BridgeError::InvalidParameter(
                "interval must be non-empty".to_string(),
            ));
        }

        let url = format!(
            "{}/instruments/historical/{}/{}",
            self.oms_root, instrument_token, interval
        );
        let params = [
            ("from", from_date),
            ("to", to_date),
            ("oi", if oi { "1" } else { "0" }),
        ];
        let (status, body) = self.send(self.client.get(&url).query(&params)).await?;
        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        let envelope: Value = serde_json::from_str(&body).map_err(|e| {
            BridgeError::ParseError(format!("Historical response was not JSON: {}", e))
        })?;
        match envelope
            .get("data")
            .and_then(|data| data.get("candles"))
            .and_then(Value::as_array)
        {
            Some(rows) => parse_candles(rows),
            None => Ok(Vec::new()),
        }
    }

    /// Account margins
    pub async fn margins(&self) -> Result<Value> {
        self.get_data(format!("{}/user/margins", self.oms_root)).await
    }

    /// Full user profile
    pub async fn profile(&self) -> Result<Value> {
        self.get_data(format!("{}/user/profile/full", self.oms_root))
            .await
    }

    /// Order book for the day
    pub async fn orders(&self) -> Result<Value> {
        self.get_data(format!("{}/orders", self.oms_root)).await
    }

    /// Net and day positions
    pub async fn positions(&self) -> Result<Value> {
        self.get_data(format!("{}/portfolio/positions", self.oms_root))
            .await
    }

    /// Demat holdings
    pub async fn holdings(&self) -> Result<Value> {
        self.get_data(format!("{}/portfolio/holdings", self.oms_root))
            .await
    }

    /// Place an order; returns the upstream order id
    pub async fn place_order(&self, params: &OrderParams) -> Result<String> {
        let url = format!("{}/orders/{}", self.oms_root, params.variety.as_str());
        debug!(
            "Placing {} {} order for {}",
            params.variety.as_str(),
            params.order_type.as_str(),
            params.tradingsymbol
        );

        let (status, body) = self.send(self.client.post(&url).form(params)).await?;
        let order_id = Self::expect_order_id(status, &body)?;
        info!("✅ Order placed: {}", order_id);
        Ok(order_id)
    }

    /// Modify an open order; returns the order id echoed by upstream
    pub async fn modify_order(&self, params: &OrderModification) -> Result<String> {
        if params.order_id.trim().is_empty() {
            return Err(BridgeError::InvalidParameter(
                "modify_order requires a non-empty order_id".to_string(),
            ));
        }

        let url = format!(
            "{}/orders/{}/{}",
            self.oms_root,
            params.variety.as_str(),
            params.order_id
        );
        let (status, body) = self.send(self.client.put(&url).form(params)).await?;
        let order_id = Self::expect_order_id(status, &body)?;
        info!("Order modified: {}", order_id);
        Ok(order_id)
    }

    /// Cancel an open order; returns the order id echoed by upstream
    pub async fn cancel_order(&self, params: &OrderCancellation) -> Result<String> {
        if params.order_id.trim().is_empty() {
            return Err(BridgeError::InvalidParameter(
                "cancel_order requires a non-empty order_id".to_string(),
            ));
        }

        let url = format!(
            "{}/orders/{}/{}",
            self.oms_root,
            params.variety.as_str(),
            params.order_id
        );
        let (status, body) = self.send(self.client.delete(&url).form(params)).await?;
        let order_id = Self::expect_order_id(status, &body)?;
        info!("Order cancelled: {}", order_id);
        Ok(order_id)
    }

    async fn get_data(&self, url: String) -> Result<Value> {
        let (status, body) = self.send(self.client.get(&url)).await?;
        Self::expect_data(status, &body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Kite returned {} ({} bytes)", status, body.len());
        Ok((status, body))
    }

    /// Unwrap the `data` field of a success envelope
    fn expect_data(status: StatusCode, body: &str) -> Result<Value> {
        if !status.is_success() {
            return Err(upstream_error(status, body));
        }

        let envelope: KiteEnvelope = serde_json::from_str(body)
            .map_err(|e| BridgeError::ParseError(format!("Kite response was not JSON: {}", e)))?;
        match envelope.data {
            Some(data) => Ok(data),
            None => Err(BridgeError::KiteApiError {
                status: status.as_u16(),
                message: compose_message(envelope.message, envelope.error_type)
                    .unwrap_or_else(|| "Response carried no data field".to_string()),
            }),
        }
    }

    fn expect_order_id(status: StatusCode, body: &str) -> Result<String> {
        let data = Self::expect_data(status, body)?;
        data.get("order_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BridgeError::KiteApiError {
                status: status.as_u16(),
                message: "Order response carried no order_id".to_string(),
            })
    }
}

fn instrument_key_params(keys: &[String]) -> Result<Vec<(&str, &str)>> {
    if keys.is_empty() {
        return Err(BridgeError::InvalidParameter(
            "at least one instrument key is required".to_string(),
        ));
    }
    Ok(keys.iter().map(|key| ("i", key.as_str())).collect())
}

fn upstream_error(status: StatusCode, body: &str) -> BridgeError {
    let message = serde_json::from_str::<KiteEnvelope>(body)
        .ok()
        .and_then(|envelope| compose_message(envelope.message, envelope.error_type))
        .unwrap_or_else(|| format!("Upstream returned HTTP {}", status.as_u16()));
    BridgeError::KiteApiError {
        status: status.as_u16(),
        message,
    }
}

fn compose_message(message: Option<String>, error_type: Option<String>) -> Option<String> {
    match (message, error_type) {
        (Some(message), Some(error_type)) => Some(format!("{}: {}", error_type, message)),
        (Some(message), None) => Some(message),
        (None, Some(error_type)) => Some(error_type),
        (None, None) => None,
    }
}
