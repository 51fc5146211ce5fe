//! AWS Lambda handler for leverage projections
//!
//! Accepts a JSON request tagged by `mode` and returns the matching
//! projection. Market rates may be supplied in the request; fallback rates
//! are used when they are missing or invalid.

use leverage_projector::{
    market::{MarketQuote, MarketRates, MarketSource, FALLBACK_RATES},
    projection::{
        ProjectionConfig, DEFAULT_INITIAL_AMOUNT, DEFAULT_LIQUIDATION_BONUS, DEFAULT_LOOPS,
        DEFAULT_MAX_SAFE_LTV, DEFAULT_MIN_BORROW, DEFAULT_SIMULATION_DAYS,
    },
    scenario::{ComparisonGenerator, DEFAULT_LTV_STEPS},
    stress::{
        default_high_borrow_periods, HighBorrowPeriod, StressSchedule, DEFAULT_DAYS_PER_PERIOD,
        DEFAULT_NUM_PERIODS,
    },
    CalcResult,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input for a projection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    /// Market rates from the caller (percent APYs, ratio LTVs)
    #[serde(default)]
    pub market: Option<MarketRates>,

    #[serde(default = "default_initial_amount")]
    pub initial_amount: f64,

    #[serde(default = "default_min_borrow")]
    pub min_borrow: f64,

    #[serde(default = "default_liquidation_bonus")]
    pub liquidation_bonus: f64,

    #[serde(flatten)]
    pub mode: RequestMode,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RequestMode {
    Loops {
        #[serde(default = "default_loops")]
        loops: u32,
        #[serde(default = "default_max_safe_ltv")]
        max_safe_ltv: f64,
    },
    MaxSafe {
        #[serde(default = "default_max_safe_ltv")]
        max_safe_ltv: f64,
    },
    Compare {
        #[serde(default = "default_ltv_steps")]
        ltv_steps: Vec<f64>,
    },
    Simulate {
        #[serde(default)]
        ltv_target: Option<f64>,
        #[serde(default = "default_days")]
        days: u32,
        #[serde(default)]
        high_borrow_periods: Vec<HighBorrowPeriod>,
    },
    Stress {
        #[serde(default = "default_ltv_steps")]
        ltv_steps: Vec<f64>,
        #[serde(default = "default_high_borrow_apr")]
        high_borrow_apr: f64,
        #[serde(default = "default_num_periods")]
        num_periods: u32,
        #[serde(default = "default_days_per_period")]
        days_per_period: u32,
    },
}

fn default_initial_amount() -> f64 { DEFAULT_INITIAL_AMOUNT }
fn default_min_borrow() -> f64 { DEFAULT_MIN_BORROW }
fn default_liquidation_bonus() -> f64 { DEFAULT_LIQUIDATION_BONUS }
fn default_loops() -> u32 { DEFAULT_LOOPS }
fn default_max_safe_ltv() -> f64 { DEFAULT_MAX_SAFE_LTV }
fn default_ltv_steps() -> Vec<f64> { DEFAULT_LTV_STEPS.to_vec() }
fn default_days() -> u32 { DEFAULT_SIMULATION_DAYS }
fn default_high_borrow_apr() -> f64 { 0.25 }
fn default_num_periods() -> u32 { DEFAULT_NUM_PERIODS }
fn default_days_per_period() -> u32 { DEFAULT_DAYS_PER_PERIOD }

/// Output from the projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    pub source: MarketSource,
    pub market: MarketRates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn market_quote(market: Option<MarketRates>) -> MarketQuote {
    match market {
        Some(rates) => match rates.validate() {
            Ok(()) => MarketQuote::Live(rates),
            Err(e) => MarketQuote::Error(e.to_string()),
        },
        None => MarketQuote::Fallback(FALLBACK_RATES),
    }
}

fn run_mode(generator: &ComparisonGenerator, mode: &RequestMode, market_ltv: f64) -> CalcResult<Value> {
    let value = match mode {
        RequestMode::Loops { loops, max_safe_ltv } => {
            let rows = generator.loop_comparison(*loops)?;
            let max_safe = generator.projector().project_max_safe(*max_safe_ltv)?;
            serde_json::json!({ "loops": rows, "maxSafe": max_safe })
        }
        RequestMode::MaxSafe { max_safe_ltv } => {
            serde_json::to_value(generator.projector().project_max_safe(*max_safe_ltv)?)?
        }
        RequestMode::Compare { ltv_steps } => serde_json::to_value(generator.ltv_comparison(ltv_steps)?)?,
        RequestMode::Simulate {
            ltv_target,
            days,
            high_borrow_periods,
        } => {
            let schedule = StressSchedule::new(high_borrow_periods.clone())?;
            let result = generator
                .projector()
                .simulate(ltv_target.unwrap_or(market_ltv), schedule, *days)?;
            serde_json::to_value(result)?
        }
        RequestMode::Stress {
            ltv_steps,
            high_borrow_apr,
            num_periods,
            days_per_period,
        } => {
            let schedule = default_high_borrow_periods(*high_borrow_apr, *num_periods, *days_per_period)?;
            serde_json::to_value(generator.stress_table(ltv_steps, &schedule)?)?
        }
    };
    Ok(value)
}

/// Lambda handler function
async fn handler(event: LambdaEvent<ProjectionRequest>) -> Result<ProjectionResponse, Error> {
    let start = std::time::Instant::now();
    let request = event.payload;

    let market = market_quote(request.market).resolve();
    let config = ProjectionConfig {
        initial_amount: request.initial_amount,
        min_borrow: request.min_borrow,
        liquidation_bonus: request.liquidation_bonus,
        ..Default::default()
    };

    let outcome = ComparisonGenerator::new(market.rates, config)
        .and_then(|generator| run_mode(&generator, &request.mode, market.rates.ltv));

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => {
            log::warn!("projection failed: {}", e);
            (None, Some(e.to_string()))
        }
    };

    Ok(ProjectionResponse {
        source: market.source,
        market: market.rates,
        result,
        execution_time_ms: start.elapsed().as_millis() as u64,
        error,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProjectionRequest {
        serde_json::from_str(json).unwrap()
    }

    fn generator() -> ComparisonGenerator {
        ComparisonGenerator::new(FALLBACK_RATES, ProjectionConfig::default()).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let request = parse(r#"{"mode":"loops"}"#);
        assert!(request.market.is_none());
        assert_eq!(request.initial_amount, DEFAULT_INITIAL_AMOUNT);
        assert!(matches!(request.mode, RequestMode::Loops { loops: 5, .. }));
    }

    #[test]
    fn test_simulate_request_with_periods() {
        let request = parse(
            r#"{"mode":"simulate","initialAmount":100,"ltvTarget":0.9,
                "highBorrowPeriods":[{"startDay":30,"endDay":44,"borrowApy":0.3}]}"#,
        );
        let value = run_mode(&generator(), &request.mode, FALLBACK_RATES.ltv).unwrap();
        assert_eq!(value["effLtv"], 0.9);
        assert!(value["points"].as_array().unwrap().len() > 50);
    }

    #[test]
    fn test_invalid_market_falls_back() {
        let request = parse(
            r#"{"mode":"maxSafe","market":{"supplyApy":6,"borrowApy":4,"ltv":1.2,"liquidationThreshold":0.9,"price":1}}"#,
        );
        let resolved = market_quote(request.market).resolve();
        assert_eq!(resolved.source, MarketSource::Fallback);
        assert_eq!(resolved.rates, FALLBACK_RATES);
    }

    #[test]
    fn test_bad_ltv_step_reports_error() {
        let request = parse(r#"{"mode":"compare","ltvSteps":[0.5,1.0]}"#);
        assert!(run_mode(&generator(), &request.mode, FALLBACK_RATES.ltv).is_err());
    }

    #[test]
    fn test_oversized_requests_report_errors() {
        for body in [
            r#"{"mode":"loops","loops":4294967295}"#,
            r#"{"mode":"simulate","days":4294967295}"#,
            r#"{"mode":"stress","numPeriods":4294967295}"#,
            r#"{"mode":"stress","daysPerPeriod":4294967295}"#,
        ] {
            let request = parse(body);
            let err = run_mode(&generator(), &request.mode, FALLBACK_RATES.ltv).unwrap_err();
            assert!(err.to_string().contains("invalid argument"), "{}: {}", body, err);
        }
    }
}
