//! Market-data contract between the rate collaborator and the engine
//!
//! The collaborator (an SDK wrapper outside this crate) hands over a
//! [`MarketQuote`]. Failures never reach the engine: [`MarketQuote::resolve`]
//! substitutes [`FALLBACK_RATES`] whenever the quote is an error.

pub mod loader;

pub use loader::{load_quote, load_quote_from_reader};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{check, CalcError, CalcResult};

/// Lending market parameters for one collateral/debt pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRates {
    /// Supply APY on the collateral asset, in percent (6.09 = 6.09%)
    pub supply_apy: f64,

    /// Borrow APY on the debt asset, in percent
    pub borrow_apy: f64,

    /// Maximum loan-to-value (e-Mode), as a ratio
    pub ltv: f64,

    /// LTV at which the position becomes liquidatable, as a ratio
    pub liquidation_threshold: f64,

    /// Collateral price in USD per unit
    pub price: f64,
}

/// Rates used when the collaborator cannot produce a live quote
pub const FALLBACK_RATES: MarketRates = MarketRates {
    supply_apy: 6.09,
    borrow_apy: 4.53,
    ltv: 0.925,
    liquidation_threshold: 0.965,
    price: 8.0,
};

impl MarketRates {
    /// Supply APY as a decimal
    pub fn supply_rate(&self) -> f64 {
        self.supply_apy / 100.0
    }

    /// Borrow APY as a decimal
    pub fn borrow_rate(&self) -> f64 {
        self.borrow_apy / 100.0
    }

    /// Check field ranges and the `ltv < liquidation_threshold` ordering
    pub fn validate(&self) -> CalcResult<()> {
        check::percent_rate("supply_apy", self.supply_apy)?;
        check::percent_rate("borrow_apy", self.borrow_apy)?;
        check::ltv("ltv", self.ltv)?;
        check::liquidation_threshold(self.liquidation_threshold)?;
        check::non_negative("price", self.price)?;

        if self.ltv >= self.liquidation_threshold {
            return Err(CalcError::invalid(
                "ltv",
                self.ltv,
                "must be below the liquidation threshold",
            ));
        }
        Ok(())
    }
}

impl Default for MarketRates {
    fn default() -> Self {
        FALLBACK_RATES
    }
}

/// Where the rates in use came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSource {
    Live,
    Fallback,
    Error,
}

/// Quote handed over by the market-data collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum MarketQuote {
    Live(MarketRates),
    Fallback(MarketRates),
    Error(String),
}

/// Rates the engine will run with, plus their provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMarket {
    pub rates: MarketRates,
    pub source: MarketSource,
    pub fetched_at: DateTime<Utc>,
}

impl MarketQuote {
    pub fn source(&self) -> MarketSource {
        match self {
            MarketQuote::Live(_) => MarketSource::Live,
            MarketQuote::Fallback(_) => MarketSource::Fallback,
            MarketQuote::Error(_) => MarketSource::Error,
        }
    }

    /// Collapse the quote into usable rates, falling back on error
    pub fn resolve(self) -> ResolvedMarket {
        let fetched_at = Utc::now();
        match self {
            MarketQuote::Live(rates) => ResolvedMarket {
                rates,
                source: MarketSource::Live,
                fetched_at,
            },
            MarketQuote::Fallback(rates) => ResolvedMarket {
                rates,
                source: MarketSource::Fallback,
                fetched_at,
            },
            MarketQuote::Error(reason) => {
                log::warn!("market data unavailable ({}), using fallback rates", reason);
                ResolvedMarket {
                    rates: FALLBACK_RATES,
                    source: MarketSource::Fallback,
                    fetched_at,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_rates_are_valid() {
        assert!(FALLBACK_RATES.validate().is_ok());
        assert!((FALLBACK_RATES.supply_rate() - 0.0609).abs() < 1e-12);
        assert!((FALLBACK_RATES.borrow_rate() - 0.0453).abs() < 1e-12);
    }

    #[test]
    fn test_error_quote_resolves_to_fallback() {
        let resolved = MarketQuote::Error("timeout".to_string()).resolve();
        assert_eq!(resolved.source, MarketSource::Fallback);
        assert_eq!(resolved.rates, FALLBACK_RATES);
    }

    #[test]
    fn test_live_quote_keeps_rates() {
        let rates = MarketRates {
            supply_apy: 7.5,
            ..FALLBACK_RATES
        };
        let resolved = MarketQuote::Live(rates).resolve();
        assert_eq!(resolved.source, MarketSource::Live);
        assert_eq!(resolved.rates.supply_apy, 7.5);
    }

    #[test]
    fn test_ltv_above_threshold_rejected() {
        let rates = MarketRates {
            ltv: 0.97,
            ..FALLBACK_RATES
        };
        assert!(rates.validate().is_err());
    }
}
