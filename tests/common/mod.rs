#![allow(dead_code)]

use chrono::NaiveDate;
pub use rulebench::domain::bar::Bar;

/// The documented example rule: conjunction entry, single-comparison exit.
pub const SAMPLE_RULE: &str = "Buy when close is above the 20-day moving average and volume is \
                               above 1000000. Exit when RSI(14) < 30.";

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn make_bar(offset: usize, close: f64, volume: i64) -> Bar {
    Bar {
        date: date(2020, 1, 1) + chrono::Duration::days(offset as i64),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, 1_500_000))
        .collect()
}

/// `count` bars climbing by `step` from `start`, constant volume.
pub fn rising_bars(count: usize, start: f64, step: f64, volume: i64) -> Vec<Bar> {
    (0..count)
        .map(|i| make_bar(i, start + step * i as f64, volume))
        .collect()
}
