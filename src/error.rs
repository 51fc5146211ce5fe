//! Error types for the projection engine

/// Errors raised by engine entry points and input loaders.
///
/// Engine calls are pure, so an error only affects the single call that
/// produced it.
#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error("invalid argument `{name}` = {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid high-borrow schedule: {0}")]
    InvalidSchedule(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type CalcResult<T> = Result<T, CalcError>;

impl CalcError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        CalcError::InvalidArgument { name, value, reason }
    }
}

/// Boundary checks shared by the engine entry points
pub(crate) mod check {
    use super::{CalcError, CalcResult};

    pub fn positive_amount(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be a finite amount greater than zero"))
        }
    }

    /// Ratio in [0, 1). A ratio of 1 would make leverage infinite.
    pub fn ltv(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && (0.0..1.0).contains(&value) {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be in [0, 1)"))
        }
    }

    /// Ratio in (0, 1)
    pub fn open_unit(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && value > 0.0 && value < 1.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be in (0, 1)"))
        }
    }

    pub fn liquidation_threshold(value: f64) -> CalcResult<f64> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid("liquidation_threshold", value, "must be in (0, 1]"))
        }
    }

    /// Annual rate as a decimal (0.05 = 5%)
    pub fn annual_rate(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && value > -1.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be a finite rate greater than -100%"))
        }
    }

    /// Annual rate in percent (5.0 = 5%)
    pub fn percent_rate(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && value > -100.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be a finite percentage greater than -100"))
        }
    }

    pub fn non_negative(name: &'static str, value: f64) -> CalcResult<f64> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid(name, value, "must be finite and non-negative"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ltv_of_one_is_rejected() {
        let err = check::ltv("ltv", 1.0).unwrap_err();
        assert!(matches!(err, CalcError::InvalidArgument { name: "ltv", .. }));
        assert!(err.to_string().contains("[0, 1)"));
    }

    #[test]
    fn test_nan_amount_is_rejected() {
        assert!(check::positive_amount("initial_amount", f64::NAN).is_err());
        assert!(check::positive_amount("initial_amount", 0.0).is_err());
        assert!(check::positive_amount("initial_amount", 1.0).is_ok());
    }

    #[test]
    fn test_rate_floor() {
        assert!(check::annual_rate("supply_apr", -1.0).is_err());
        assert!(check::annual_rate("supply_apr", -0.5).is_ok());
        assert!(check::percent_rate("supply_apy", -100.0).is_err());
        assert!(check::percent_rate("supply_apy", 6.09).is_ok());
    }
}
