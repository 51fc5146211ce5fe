//! JSON loader for collaborator market records
//!
//! Reads the `{supplyApy, borrowApy, ltv, liquidationThreshold, price, source}`
//! record the rate collaborator emits. Every failure mode (missing file, bad
//! JSON, null fields, `source: "error"`) becomes a [`MarketQuote::Error`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{MarketQuote, MarketRates, MarketSource};

/// Raw record; numeric fields are null when the collaborator failed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuote {
    supply_apy: Option<f64>,
    borrow_apy: Option<f64>,
    ltv: Option<f64>,
    liquidation_threshold: Option<f64>,
    price: Option<f64>,
    source: MarketSource,
    #[serde(default)]
    error: Option<String>,
}

impl RawQuote {
    fn into_quote(self) -> MarketQuote {
        if self.source == MarketSource::Error {
            let reason = self.error.unwrap_or_else(|| "collaborator reported an error".to_string());
            return MarketQuote::Error(reason);
        }

        let fields = (
            self.supply_apy,
            self.borrow_apy,
            self.ltv,
            self.liquidation_threshold,
            self.price,
        );
        let rates = match fields {
            (Some(supply_apy), Some(borrow_apy), Some(ltv), Some(liquidation_threshold), Some(price)) => {
                MarketRates {
                    supply_apy,
                    borrow_apy,
                    ltv,
                    liquidation_threshold,
                    price,
                }
            }
            _ => return MarketQuote::Error("market record has missing fields".to_string()),
        };

        if let Err(e) = rates.validate() {
            return MarketQuote::Error(e.to_string());
        }

        match self.source {
            MarketSource::Live => MarketQuote::Live(rates),
            _ => MarketQuote::Fallback(rates),
        }
    }
}

/// Parse a market record from any reader
pub fn load_quote_from_reader<R: Read>(reader: R) -> MarketQuote {
    match serde_json::from_reader::<_, RawQuote>(reader) {
        Ok(raw) => raw.into_quote(),
        Err(e) => MarketQuote::Error(format!("malformed market record: {}", e)),
    }
}

/// Load a market record from a JSON file
pub fn load_quote(path: &Path) -> MarketQuote {
    match File::open(path) {
        Ok(file) => load_quote_from_reader(file),
        Err(e) => MarketQuote::Error(format!("cannot open {}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::FALLBACK_RATES;

    #[test]
    fn test_live_record() {
        let json = r#"{"supplyApy":7.1,"borrowApy":5.2,"ltv":0.925,"liquidationThreshold":0.965,"price":9.5,"source":"live"}"#;
        match load_quote_from_reader(json.as_bytes()) {
            MarketQuote::Live(rates) => {
                assert_eq!(rates.supply_apy, 7.1);
                assert_eq!(rates.price, 9.5);
            }
            other => panic!("expected live quote, got {:?}", other),
        }
    }

    #[test]
    fn test_error_record_with_nulls() {
        let json = r#"{"supplyApy":null,"borrowApy":null,"ltv":null,"liquidationThreshold":null,"price":null,"source":"error","error":"sdk down"}"#;
        let quote = load_quote_from_reader(json.as_bytes());
        assert_eq!(quote, MarketQuote::Error("sdk down".to_string()));
        assert_eq!(quote.resolve().rates, FALLBACK_RATES);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let quote = load_quote_from_reader("{not json".as_bytes());
        assert_eq!(quote.source(), MarketSource::Error);
    }

    #[test]
    fn test_missing_field_is_error() {
        let json = r#"{"supplyApy":7.1,"borrowApy":5.2,"ltv":0.925,"price":9.5,"source":"live"}"#;
        assert_eq!(load_quote_from_reader(json.as_bytes()).source(), MarketSource::Error);
    }

    #[test]
    fn test_missing_file_is_error() {
        let quote = load_quote(Path::new("does/not/exist.json"));
        assert_eq!(quote.source(), MarketSource::Error);
    }
}
