/// Historical candle parsing
///
/// The historical API returns candles as positional JSON arrays:
/// `[date, open, high, low, close, volume]` with an optional seventh
/// element carrying open interest.
use chrono::DateTime;
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::types::Candle;

/// Timestamp format of candle rows, e.g. `2024-08-23T09:15:00+0530`
const CANDLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

pub fn parse_candles(rows: &[Value]) -> Result<Vec<Candle>> {
    rows.iter().map(parse_candle_row).collect()
}

fn parse_candle_row(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| BridgeError::ParseError("candle row is not an array".to_string()))?;

    if fields.len() < 6 {
        return Err(BridgeError::ParseError(format!(
            "candle row has {} elements, expected at least 6",
            fields.len()
        )));
    }

    let raw_date = fields[0]
        .as_str()
        .ok_or_else(|| BridgeError::ParseError("candle date is not a string".to_string()))?;
    let date = DateTime::parse_from_str(raw_date, CANDLE_TIMESTAMP_FORMAT)
        .map_err(|e| BridgeError::ParseError(format!("candle date {:?}: {}", raw_date, e)))?;

    Ok(Candle {
        date,
        open: number(&fields[1], "open")?,
        high: number(&fields[2], "high")?,
        low: number(&fields[3], "low")?,
        close: number(&fields[4], "close")?,
        volume: integer(&fields[5], "volume")?,
        // Open interest rides along only on exactly-seven-element rows
        oi: if fields.len() == 7 {
            Some(integer(&fields[6], "oi")?)
        } else {
            None
        },
    })
}

fn number(value: &Value, field: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| BridgeError::ParseError(format!("candle {}: not a number: {}", field, value)))
}

fn integer(value: &Value, field: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| BridgeError::ParseError(format!("candle {}: not an integer: {}", field, value)))
}
