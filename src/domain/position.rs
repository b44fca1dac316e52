//! Position state and trade records.

use chrono::NaiveDate;
use serde::Serialize;

/// Simulated position, owned exclusively by the backtest engine for the
/// duration of one run. Transitions only on Enter/Exit signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Flat,
    Long { entry_price: f64, entry_index: usize },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}

/// One completed round trip, appended to the trade log on every exit.
/// Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Fractional realized return on the round trip, fees included.
    pub realized_return: f64,
    /// True when the series ended while the position was still open.
    pub forced_exit: bool,
}
