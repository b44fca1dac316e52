//! Backtest report assembly.
//!
//! All metrics are recomputed from the full trade log on every run; nothing
//! incremental survives between runs. Percentages are rounded to 4 decimal
//! places so repeated runs over identical inputs serialize byte-identically.

use crate::domain::position::TradeRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub trades: Vec<TradeRecord>,
    pub num_trades: usize,
    /// Compounded return across the trade log, percent.
    pub total_return_pct: f64,
    /// Fraction of trades with positive realized return.
    pub win_rate: f64,
    /// Largest peak-to-trough decline of the capital-tracked equity
    /// sequence built by walking trades in order, percent.
    pub max_drawdown_pct: f64,
    /// Mean realized return per trade, percent.
    pub avg_trade_return_pct: f64,
}

impl Report {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let num_trades = trades.len();

        let mut compounded = 1.0;
        for trade in trades {
            compounded *= 1.0 + trade.realized_return;
        }
        let total_return_pct = round4((compounded - 1.0) * 100.0);

        let wins = trades.iter().filter(|t| t.realized_return > 0.0).count();
        let win_rate = if num_trades > 0 {
            round4(wins as f64 / num_trades as f64)
        } else {
            0.0
        };

        let max_drawdown_pct = round4(max_drawdown(trades) * 100.0);

        let avg_trade_return_pct = if num_trades > 0 {
            let sum: f64 = trades.iter().map(|t| t.realized_return).sum();
            round4(sum / num_trades as f64 * 100.0)
        } else {
            0.0
        };

        Report {
            trades: trades.to_vec(),
            num_trades,
            total_return_pct,
            win_rate,
            max_drawdown_pct,
            avg_trade_return_pct,
        }
    }
}

fn max_drawdown(trades: &[TradeRecord]) -> f64 {
    let mut equity = 1.0;
    let mut peak = 1.0;
    let mut max_dd = 0.0_f64;
    for trade in trades {
        equity *= 1.0 + trade.realized_return;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
