//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bar of the historical series. Read-only to the core; the engine and
/// indicators never mutate the series they are handed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// True when every price field is a finite number.
    pub fn has_finite_prices(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}
