//! Annual-to-periodic rate conversion

/// Days per compounding year
pub const DAYS_PER_YEAR: u32 = 365;

/// Months per compounding year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Convert an annual rate to the equivalent daily compounding rate
///
/// `(1 + annual)^(1/365) - 1`, so compounding the result for 365 days
/// reproduces `annual`. Only meaningful for `annual > -1`; callers validate.
pub fn daily_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / DAYS_PER_YEAR as f64) - 1.0
}

/// Nominal monthly rate used by the 12-period loop projection
pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / MONTHS_PER_YEAR as f64
}

/// Growth factor minus one after compounding `rate` for `periods` periods
pub fn compound(rate: f64, periods: u32) -> f64 {
    (1.0 + rate).powi(periods as i32) - 1.0
}
