//! Data access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::RulebenchError;

/// Supplies the historical series a backtest runs over. The series is
/// read-only to the core and may be shared across concurrent runs.
pub trait DataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, RulebenchError>;
}
