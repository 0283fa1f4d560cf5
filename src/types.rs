/// Core type definitions for the Kite bridge
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the Kite instrument dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_token: i64,
    pub exchange_token: String,
    pub tradingsymbol: String,
    pub name: String,
    pub last_price: f64,
    pub expiry: Option<NaiveDate>,
    pub strike: f64,
    pub tick_size: f64,
    pub lot_size: i64,
    pub instrument_type: String,
    pub segment: String,
    pub exchange: String,
}

/// OHLCV candle from the historical data API
///
/// `oi` is only present for derivative candles requested with open
/// interest enabled; it is omitted from serialized output otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub date: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi: Option<i64>,
}

/// Order variety (URL path segment and form field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variety {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "amo")]
    Amo,
    #[serde(rename = "co")]
    Co,
}

impl Variety {
    pub fn as_str(&self) -> &str {
        match self {
            Variety::Regular => "regular",
            Variety::Amo => "amo",
            Variety::Co => "co",
        }
    }
}

/// Exchange segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "NSE")]
    Nse,
    #[serde(rename = "BSE")]
    Bse,
    #[serde(rename = "NFO")]
    Nfo,
    #[serde(rename = "CDS")]
    Cds,
    #[serde(rename = "BFO")]
    Bfo,
    #[serde(rename = "MCX")]
    Mcx,
}

impl Exchange {
    pub fn as_str(&self) -> &str {
        match self {
            Exchange::Nse => "NSE",
            Exchange::Bse => "BSE",
            Exchange::Nfo => "NFO",
            Exchange::Cds => "CDS",
            Exchange::Bfo => "BFO",
            Exchange::Mcx => "MCX",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NSE" => Some(Exchange::Nse),
            "BSE" => Some(Exchange::Bse),
            "NFO" => Some(Exchange::Nfo),
            "CDS" => Some(Exchange::Cds),
            "BFO" => Some(Exchange::Bfo),
            "MCX" => Some(Exchange::Mcx),
            _ => None,
        }
    }
}

/// Trade side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

/// Product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "MIS")]
    Mis,
    #[serde(rename = "CNC")]
    Cnc,
    #[serde(rename = "NRML")]
    Nrml,
    #[serde(rename = "CO")]
    Co,
}

impl Product {
    pub fn as_str(&self) -> &str {
        match self {
            Product::Mis => "MIS",
            Product::Cnc => "CNC",
            Product::Nrml => "NRML",
            Product::Co => "CO",
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "MARKET")]
    Market,
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "SL")]
    StopLoss,
    #[serde(rename = "SL-M")]
    StopLossMarket,
}

impl OrderType {
    pub fn as_str(&self) -> &str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopLoss => "SL",
            OrderType::StopLossMarket => "SL-M",
        }
    }
}

/// Order validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    #[serde(rename = "DAY")]
    Day,
    #[serde(rename = "IOC")]
    Ioc,
}

impl Validity {
    pub fn as_str(&self) -> &str {
        match self {
            Validity::Day => "DAY",
            Validity::Ioc => "IOC",
        }
    }
}

/// Parameters for placing an order
///
/// Serializes straight into the form body sent upstream; unset optional
/// fields are dropped rather than sent as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderParams {
    pub variety: Variety,
    pub exchange: Exchange,
    pub tradingsymbol: String,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub product: Product,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclosed_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squareoff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stoploss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_stoploss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Parameters for modifying an open order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderModification {
    pub variety: Variety,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclosed_quantity: Option<i64>,
}

/// Parameters for cancelling an order
///
/// `variety` and `order_id` route the request; only `parent_order_id`
/// ever travels in the body (cover order legs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderCancellation {
    #[serde(skip_serializing)]
    pub variety: Variety,
    #[serde(skip_serializing)]
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order_id: Option<String>,
}

/// Configuration for the bridge
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP Server
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // Upstream Endpoints
    #[serde(default = "default_auth_root")]
    pub auth_root: String,
    #[serde(default = "default_oms_root")]
    pub oms_root: String,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    // Session Store
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_auth_root() -> String {
    "https://kite.zerodha.com".to_string()
}

fn default_oms_root() -> String {
    "https://kite.zerodha.com/oms".to_string()
}

fn default_api_root() -> String {
    "https://api.kite.trade".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_log_level() -> String {
    "kitebridge=debug,info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: default_host(),
            port: default_port(),
            auth_root: default_auth_root(),
            oms_root: default_oms_root(),
            api_root: default_api_root(),
            http_timeout_secs: default_http_timeout_secs(),
            session_ttl_hours: default_session_ttl_hours(),
            log_level: default_log_level(),
        }
    }
}
