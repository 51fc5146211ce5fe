//! Borrow-rate stress schedules
//!
//! A schedule is an ordered list of [`HighBorrowPeriod`] windows that
//! override the normal borrow APR on the days they cover.

pub mod loader;

pub use loader::{load_periods, load_periods_from_reader};

use serde::{Deserialize, Serialize};

use crate::error::{check, CalcError, CalcResult};

/// Start days used when exactly three periods are requested
pub const DEFAULT_PERIOD_STARTS: [u32; 3] = [30, 120, 250];

/// Default number of stress periods in a year
pub const DEFAULT_NUM_PERIODS: u32 = 3;

/// Default length of a stress period, in days
pub const DEFAULT_DAYS_PER_PERIOD: u32 = 15;

/// Most periods a generated schedule may hold
pub const MAX_NUM_PERIODS: u32 = 365;

/// Longest generated period, in days
pub const MAX_DAYS_PER_PERIOD: u32 = 365;

/// Last day index of a 365-day horizon
const LAST_DAY_OF_YEAR: u32 = 364;

/// Closed day interval with an elevated borrow APR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighBorrowPeriod {
    pub start_day: u32,

    /// Inclusive
    pub end_day: u32,

    /// Annual borrow rate during the period, as a decimal
    pub borrow_apy: f64,
}

impl HighBorrowPeriod {
    pub fn new(start_day: u32, end_day: u32, borrow_apy: f64) -> CalcResult<Self> {
        let period = Self {
            start_day,
            end_day,
            borrow_apy,
        };
        period.validate()?;
        Ok(period)
    }

    pub fn contains(&self, day: u32) -> bool {
        self.start_day <= day && day <= self.end_day
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.end_day < self.start_day {
            return Err(CalcError::InvalidSchedule(format!(
                "period ends on day {} before it starts on day {}",
                self.end_day, self.start_day
            )));
        }
        check::annual_rate("borrow_apy", self.borrow_apy)?;
        Ok(())
    }
}

/// Ordered, validated list of stress periods
///
/// Periods are not merged. When they overlap, the first one in list order
/// that covers a day sets that day's rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressSchedule {
    periods: Vec<HighBorrowPeriod>,
}

impl StressSchedule {
    /// Schedule with no stress: the normal borrow rate applies every day
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(periods: Vec<HighBorrowPeriod>) -> CalcResult<Self> {
        for period in &periods {
            period.validate()?;
        }
        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[HighBorrowPeriod] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period that sets the rate on `day`, if any
    pub fn period_for_day(&self, day: u32) -> Option<&HighBorrowPeriod> {
        self.periods.iter().find(|p| p.contains(day))
    }

    /// Annual borrow rate in force on `day`
    pub fn rate_for_day(&self, day: u32, normal_rate: f64) -> f64 {
        self.period_for_day(day)
            .map(|p| p.borrow_apy)
            .unwrap_or(normal_rate)
    }

    /// Days within `0..horizon` covered by at least one period
    pub fn stressed_days(&self, horizon: u32) -> u32 {
        (0..horizon).filter(|&d| self.period_for_day(d).is_some()).count() as u32
    }
}

/// Spread `num_periods` windows of `days_per_period` days across a year
///
/// Three periods start on days 30, 120 and 250. Any other count is spaced
/// evenly at `365 / (n + 1)` intervals, centred on each spacing mark and
/// clipped to the year.
pub fn default_high_borrow_periods(
    high_borrow_apr: f64,
    num_periods: u32,
    days_per_period: u32,
) -> CalcResult<StressSchedule> {
    check::annual_rate("high_borrow_apr", high_borrow_apr)?;
    if num_periods > MAX_NUM_PERIODS {
        return Err(CalcError::invalid(
            "num_periods",
            num_periods as f64,
            "at most one period per day of the year",
        ));
    }
    if days_per_period > MAX_DAYS_PER_PERIOD {
        return Err(CalcError::invalid(
            "days_per_period",
            days_per_period as f64,
            "longer than a year",
        ));
    }

    if num_periods == 0 || days_per_period == 0 {
        return Ok(StressSchedule::none());
    }

    let periods = if num_periods == 3 {
        DEFAULT_PERIOD_STARTS
            .iter()
            .map(|&start| HighBorrowPeriod {
                start_day: start,
                end_day: start + days_per_period - 1,
                borrow_apy: high_borrow_apr,
            })
            .collect()
    } else {
        let spacing = 365 / (num_periods as i64 + 1);
        let half = days_per_period as i64 / 2;
        (0..num_periods as i64)
            .filter_map(|i| {
                let start = spacing * (i + 1) - half;
                let end = (start + days_per_period as i64 - 1).min(LAST_DAY_OF_YEAR as i64);
                let start = start.max(0);
                // Windows pushed entirely outside the year are dropped
                if end < start {
                    return None;
                }
                Some(HighBorrowPeriod {
                    start_day: start as u32,
                    end_day: end as u32,
                    borrow_apy: high_borrow_apr,
                })
            })
            .collect()
    };

    StressSchedule::new(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_default_periods() {
        let schedule = default_high_borrow_periods(0.25, 3, 15).unwrap();
        let periods = schedule.periods();
        assert_eq!(periods.len(), 3);
        assert_eq!((periods[0].start_day, periods[0].end_day), (30, 44));
        assert_eq!((periods[1].start_day, periods[1].end_day), (120, 134));
        assert_eq!((periods[2].start_day, periods[2].end_day), (250, 264));
        assert_eq!(schedule.stressed_days(365), 45);
    }

    #[test]
    fn test_evenly_spaced_periods() {
        // spacing = 365 / 3 = 121, half = 5
        let schedule = default_high_borrow_periods(0.25, 2, 10).unwrap();
        let periods = schedule.periods();
        assert_eq!(periods.len(), 2);
        assert_eq!((periods[0].start_day, periods[0].end_day), (116, 125));
        assert_eq!((periods[1].start_day, periods[1].end_day), (237, 246));
    }

    #[test]
    fn test_long_periods_are_clipped() {
        // spacing = 121, half = 150: first start clamps to 0, second end to 364
        let schedule = default_high_borrow_periods(0.25, 2, 300).unwrap();
        let periods = schedule.periods();
        assert_eq!((periods[0].start_day, periods[0].end_day), (0, 270));
        assert_eq!((periods[1].start_day, periods[1].end_day), (92, 364));
    }

    #[test]
    fn test_generated_schedule_limits() {
        let err = default_high_borrow_periods(0.25, 3, u32::MAX).unwrap_err();
        assert!(matches!(err, CalcError::InvalidArgument { name: "days_per_period", .. }));

        let err = default_high_borrow_periods(0.25, u32::MAX, 15).unwrap_err();
        assert!(matches!(err, CalcError::InvalidArgument { name: "num_periods", .. }));

        let widest = default_high_borrow_periods(0.25, 3, MAX_DAYS_PER_PERIOD).unwrap();
        assert_eq!(widest.periods()[2].end_day, 250 + MAX_DAYS_PER_PERIOD - 1);
        let densest = default_high_borrow_periods(0.25, MAX_NUM_PERIODS, 1).unwrap();
        assert!(densest.periods().len() <= MAX_NUM_PERIODS as usize);
    }

    #[test]
    fn test_zero_periods_is_empty() {
        assert!(default_high_borrow_periods(0.25, 0, 15).unwrap().is_empty());
        assert!(default_high_borrow_periods(0.25, 3, 0).unwrap().is_empty());
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let schedule = StressSchedule::new(vec![
            HighBorrowPeriod::new(10, 20, 0.30).unwrap(),
            HighBorrowPeriod::new(15, 25, 0.50).unwrap(),
        ])
        .unwrap();

        assert_eq!(schedule.rate_for_day(5, 0.05), 0.05);
        assert_eq!(schedule.rate_for_day(10, 0.05), 0.30);
        assert_eq!(schedule.rate_for_day(18, 0.05), 0.30);
        assert_eq!(schedule.rate_for_day(20, 0.05), 0.30);
        assert_eq!(schedule.rate_for_day(21, 0.05), 0.50);
        assert_eq!(schedule.rate_for_day(26, 0.05), 0.05);
    }

    #[test]
    fn test_inverted_period_rejected() {
        let err = HighBorrowPeriod::new(20, 10, 0.3).unwrap_err();
        assert!(matches!(err, CalcError::InvalidSchedule(_)));
    }

    #[test]
    fn test_period_bounds_inclusive() {
        let period = HighBorrowPeriod::new(30, 44, 0.3).unwrap();
        assert!(!period.contains(29));
        assert!(period.contains(30) && period.contains(44));
        assert!(!period.contains(45));
    }
}
