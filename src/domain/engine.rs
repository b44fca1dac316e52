//! Backtest engine: a single forward pass over the historical series.
//!
//! Indicator values at bar `i` come from causal series, so no lookahead is
//! possible. The position state machine:
//!
//! - **Flat** — on `Enter`: open Long at the current bar's close.
//! - **Long** — on `Exit` or end-of-series: close at the current close,
//!   append a trade record, return to Flat.
//!
//! Exit takes precedence over entry within one bar: a Long position
//! flattens and does not re-enter that bar. A position still open at series
//! end is force-closed at the final close and flagged `forced_exit`.

use crate::domain::bar::Bar;
use crate::domain::codegen::{CompiledStrategy, Signal};
use crate::domain::error::RulebenchError;
use crate::domain::indicator;
use crate::domain::position::{Position, TradeRecord};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// Execution parameters. The zero baseline models no fees, no slippage and
/// full-capital fills; both cost knobs are explicit caller-supplied
/// configuration, never implied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub initial_capital: f64,
    /// Fee charged on each leg as a fraction of traded value.
    pub fee_rate: f64,
    /// Adverse fill adjustment in percent: entries fill above the close,
    /// exits below it.
    pub slippage_pct: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            initial_capital: 10_000.0,
            fee_rate: 0.0,
            slippage_pct: 0.0,
        }
    }
}

/// Entry fill: execution_price = close * (1 + slippage_pct / 100)
pub fn entry_fill(close: f64, slippage_pct: f64) -> f64 {
    close * (1.0 + slippage_pct / 100.0)
}

/// Exit fill: execution_price = close * (1 - slippage_pct / 100)
pub fn exit_fill(close: f64, slippage_pct: f64) -> f64 {
    close * (1.0 - slippage_pct / 100.0)
}

/// Net fractional return of a round trip after fees on both legs.
fn net_return(entry_price: f64, exit_price: f64, fee_rate: f64) -> f64 {
    (exit_price * (1.0 - fee_rate)) / (entry_price * (1.0 + fee_rate)) - 1.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Outcome of one run: the trade log, a per-bar equity curve, final capital
/// and the count of Invalid indicator samples encountered (bars that held
/// because an indicator computation produced a non-finite value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_capital: f64,
    pub numeric_faults: usize,
}

/// Replay the strategy over the series.
///
/// Fails with `InsufficientData` when the series cannot cover the longest
/// indicator warm-up; the run does not proceed with partial indicators.
pub fn run(
    strategy: &CompiledStrategy,
    bars: &[Bar],
    config: &RunConfig,
) -> Result<BacktestResult, RulebenchError> {
    let required = strategy.min_bars();
    if bars.len() < required {
        return Err(RulebenchError::InsufficientData {
            bars: bars.len(),
            required,
        });
    }

    let tables = indicator::compute_all(bars, strategy.indicators());
    let numeric_faults: usize = tables.values().map(|s| s.invalid_count()).sum();
    if numeric_faults > 0 {
        warn!(
            faults = numeric_faults,
            "indicator series contain invalid samples; affected bars hold"
        );
    }

    let mut position = Position::Flat;
    let mut capital = config.initial_capital;
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let signal = strategy.signal(&tables, i);
        match position {
            Position::Long {
                entry_price,
                entry_index,
            } if signal == Signal::Exit => {
                let fill = exit_fill(bar.close, config.slippage_pct);
                let realized = net_return(entry_price, fill, config.fee_rate);
                capital *= 1.0 + realized;
                trades.push(TradeRecord {
                    entry_index,
                    exit_index: i,
                    entry_date: bars[entry_index].date,
                    exit_date: bar.date,
                    entry_price,
                    exit_price: fill,
                    realized_return: realized,
                    forced_exit: false,
                });
                position = Position::Flat;
                debug!(bar = i, return_pct = realized * 100.0, "closed long");
            }
            Position::Flat if signal == Signal::Enter => {
                position = Position::Long {
                    entry_price: entry_fill(bar.close, config.slippage_pct),
                    entry_index: i,
                };
                debug!(bar = i, price = bar.close, "opened long");
            }
            _ => {}
        }

        let equity = match position {
            Position::Flat => capital,
            Position::Long { entry_price, .. } => capital * (bar.close / entry_price),
        };
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity,
        });
    }

    if let Position::Long {
        entry_price,
        entry_index,
    } = position
    {
        let last = bars.len() - 1;
        let bar = &bars[last];
        let fill = exit_fill(bar.close, config.slippage_pct);
        let realized = net_return(entry_price, fill, config.fee_rate);
        capital *= 1.0 + realized;
        trades.push(TradeRecord {
            entry_index,
            exit_index: last,
            entry_date: bars[entry_index].date,
            exit_date: bar.date,
            entry_price,
            exit_price: fill,
            realized_return: realized,
            forced_exit: true,
        });
        if let Some(point) = equity_curve.last_mut() {
            point.equity = capital;
        }
        debug!(bar = last, "forced exit at end of series");
    }

    Ok(BacktestResult {
        trades,
        equity_curve,
        final_capital: capital,
        numeric_faults,
    })
}
