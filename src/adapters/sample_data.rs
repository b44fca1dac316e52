//! Built-in demo series.
//!
//! The nine bars the hosted product shipped for its demo backtests. Used
//! whenever no CSV data source is configured, so the server and CLI work
//! out of the box.

use crate::domain::bar::Bar;
use crate::domain::error::RulebenchError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;

const SAMPLE_ROWS: [(u32, f64, f64, f64, f64, i64); 9] = [
    (1, 100.0, 101.0, 99.0, 100.5, 100_000),
    (2, 100.5, 102.0, 100.0, 101.0, 120_000),
    (3, 101.0, 103.0, 100.5, 102.5, 150_000),
    (4, 102.5, 104.0, 101.5, 103.0, 130_000),
    (5, 103.0, 103.5, 100.0, 100.5, 200_000),
    (6, 100.5, 101.5, 99.5, 100.0, 300_000),
    (7, 100.0, 102.0, 99.0, 101.0, 500_000),
    (8, 101.0, 103.5, 100.5, 103.0, 600_000),
    (9, 103.0, 106.0, 102.0, 105.5, 700_000),
];

pub fn sample_bars() -> Vec<Bar> {
    SAMPLE_ROWS
        .iter()
        .map(|&(day, open, high, low, close, volume)| Bar {
            date: NaiveDate::from_ymd_opt(2020, 1, day).expect("static sample dates are valid"),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

pub struct SampleBarSource;

impl DataPort for SampleBarSource {
    fn fetch_bars(&self) -> Result<Vec<Bar>, RulebenchError> {
        Ok(sample_bars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_bars_in_date_order() {
        let bars = sample_bars();
        assert_eq!(bars.len(), 9);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn values_match_the_demo_series() {
        let bars = sample_bars();
        assert!((bars[0].close - 100.5).abs() < f64::EPSILON);
        assert_eq!(bars[8].volume, 700_000);
        assert!((bars[8].close - 105.5).abs() < f64::EPSILON);
    }

    #[test]
    fn source_is_infallible() {
        let bars = SampleBarSource.fetch_bars().unwrap();
        assert_eq!(bars.len(), 9);
    }
}
