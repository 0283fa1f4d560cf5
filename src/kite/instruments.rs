/// Instrument dump parsing
///
/// The dump arrives as one CSV document with a header line and twelve
/// positional columns per row. Column meaning is fixed by position, not
/// by header name.
use csv::StringRecord;

use crate::error::{BridgeError, Result};
use crate::types::{Exchange, Instrument};

const DUMP_COLUMNS: usize = 12;

/// Date format of the expiry column, e.g. `2024-08-29`
const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Parse the raw CSV dump into typed instruments, optionally keeping
/// only rows whose exchange column matches `exchange`.
pub fn parse_instrument_dump(raw: &str, exchange: Option<Exchange>) -> Result<Vec<Instrument>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());

    let mut instruments = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| BridgeError::ParseError(format!("instrument dump: {}", e)))?;
        if record.len() != DUMP_COLUMNS {
            return Err(BridgeError::ParseError(format!(
                "instrument dump row has {} columns, expected {}",
                record.len(),
                DUMP_COLUMNS
            )));
        }

        let instrument = parse_row(&record)?;
        if let Some(wanted) = exchange {
            if instrument.exchange != wanted.as_str() {
                continue;
            }
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}

fn parse_row(record: &StringRecord) -> Result<Instrument> {
    Ok(Instrument {
        instrument_token: parse_integer(&record[0], "instrument_token")?,
        exchange_token: record[1].to_string(),
        tradingsymbol: record[2].to_string(),
        name: record[3].to_string(),
        last_price: parse_number(&record[4], "last_price")?,
        expiry: parse_expiry(&record[5])?,
        strike: parse_number(&record[6], "strike")?,
        tick_size: parse_number(&record[7], "tick_size")?,
        lot_size: parse_integer(&record[8], "lot_size")?,
        instrument_type: record[9].to_string(),
        segment: record[10].to_string(),
        exchange: record[11].to_string(),
    })
}

fn parse_integer(raw: &str, field: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| BridgeError::ParseError(format!("instrument {}: not an integer: {:?}", field, raw)))
}

fn parse_number(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| BridgeError::ParseError(format!("instrument {}: not a number: {:?}", field, raw)))
}

fn parse_expiry(raw: &str) -> Result<Option<chrono::NaiveDate>> {
    if raw.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(raw, EXPIRY_FORMAT)
        .map(Some)
        .map_err(|_| BridgeError::ParseError(format!("instrument expiry: bad date: {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dump() -> String {
        [
            "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange",
            "408065,1594,INFY,\"INFOSYS\",1450.55,,0.0,0.05,1,EQ,NSE,NSE",
            "128028676,500112,SBIN,\"STATE BANK OF INDIA\",815.2,,0.0,0.05,1,EQ,BSE,BSE",
            "12683266,49544,NIFTY24AUGFUT,\"NIFTY\",24800.0,2024-08-29,0.0,0.05,25,FUT,NFO-FUT,NFO",
            "",
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_all_rows() {
        let instruments = parse_instrument_dump(&sample_dump(), None).unwrap();
        assert_eq!(instruments.len(), 3);

        let infy = &instruments[0];
        assert_eq!(infy.instrument_token, 408065);
        assert_eq!(infy.exchange_token, "1594");
        assert_eq!(infy.tradingsymbol, "INFY");
        assert_eq!(infy.last_price, 1450.55);
        assert_eq!(infy.expiry, None);
        assert_eq!(infy.lot_size, 1);
        assert_eq!(infy.exchange, "NSE");
    }

    #[test]
    fn test_single_row_dump_yields_one_instrument() {
        let raw = [
            "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange",
            "408065,1594,INFY,\"INFOSYS\",1450.55,,0.0,0.05,1,EQ,NSE,NSE",
            "",
        ]
        .join("\n");
        let instruments = parse_instrument_dump(&raw, None).unwrap();
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].instrument_token, 408065);
        assert_eq!(instruments[0].name, "INFOSYS");
    }

    #[test]
    fn test_name_quotes_are_stripped() {
        let instruments = parse_instrument_dump(&sample_dump(), None).unwrap();
        assert_eq!(instruments[0].name, "INFOSYS");
        assert_eq!(instruments[1].name, "STATE BANK OF INDIA");
    }

    #[test]
    fn test_exchange_filter() {
        let nse = parse_instrument_dump(&sample_dump(), Some(Exchange::Nse)).unwrap();
        assert_eq!(nse.len(), 1);
        assert_eq!(nse[0].tradingsymbol, "INFY");

        let mcx = parse_instrument_dump(&sample_dump(), Some(Exchange::Mcx)).unwrap();
        assert!(mcx.is_empty());
    }

    #[test]
    fn test_expiry_column_parses_when_present() {
        let instruments = parse_instrument_dump(&sample_dump(), Some(Exchange::Nfo)).unwrap();
        assert_eq!(
            instruments[0].expiry,
            Some(chrono::NaiveDate::from_ymd_opt(2024, 8, 29).unwrap())
        );
    }

    #[test]
    fn test_header_only_dump_is_empty() {
        let raw = "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange\n";
        let instruments = parse_instrument_dump(raw, None).unwrap();
        assert!(instruments.is_empty());
    }

    #[test]
    fn test_malformed_numeric_column_is_an_error() {
        let raw = [
            "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange",
            "notanumber,1594,INFY,\"INFOSYS\",1450.55,,0.0,0.05,1,EQ,NSE,NSE",
        ]
        .join("\n");
        let err = parse_instrument_dump(&raw, None).unwrap_err();
        assert!(matches!(err, BridgeError::ParseError(_)));
    }

    #[test]
    fn test_short_row_is_an_error() {
        let raw = [
            "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange",
            "408065,1594,INFY",
        ]
        .join("\n");
        assert!(parse_instrument_dump(&raw, None).is_err());
    }

    #[test]
    fn test_bad_expiry_is_an_error() {
        let raw = [
            "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange",
            "12683266,49544,NIFTY24AUGFUT,\"NIFTY\",24800.0,29-08-2024,0.0,0.05,25,FUT,NFO-FUT,NFO",
        ]
        .join("\n");
        assert!(parse_instrument_dump(&raw, None).is_err());
    }
}
