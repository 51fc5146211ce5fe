//! CSV loader for custom stress schedules
//!
//! Expected columns: `start_day,end_day,borrow_apy` with `borrow_apy` as a
//! decimal (0.25 = 25%). Row order is preserved since it decides which
//! period wins on overlapping days.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{HighBorrowPeriod, StressSchedule};
use crate::error::CalcResult;

#[derive(Debug, Deserialize)]
struct CsvRow {
    start_day: u32,
    end_day: u32,
    borrow_apy: f64,
}

/// Load a stress schedule from any CSV reader
pub fn load_periods_from_reader<R: Read>(reader: R) -> CalcResult<StressSchedule> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut periods = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        periods.push(HighBorrowPeriod::new(row.start_day, row.end_day, row.borrow_apy)?);
    }

    log::debug!("loaded {} high-borrow periods", periods.len());
    StressSchedule::new(periods)
}

/// Load a stress schedule from a CSV file
pub fn load_periods(path: &Path) -> CalcResult<StressSchedule> {
    let file = File::open(path)?;
    load_periods_from_reader(file)
}
