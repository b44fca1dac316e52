//! Technical indicator series with explicit readiness.
//!
//! Every indicator is a pure function from the historical window to an
//! index-aligned series of tri-state samples. Warm-up bars are `NotReady`;
//! a computation that produces a non-finite number is `Invalid`. Neither is
//! ever collapsed into a sentinel value, so NaN cannot leak into signal
//! evaluation.

pub mod rsi;
pub mod sma;

use crate::domain::ast::IndicatorKind;
use crate::domain::bar::Bar;
use std::collections::HashMap;

/// One indicator value at one bar index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorSample {
    Ready(f64),
    NotReady,
    Invalid,
}

impl IndicatorSample {
    /// Classify a computed value: finite numbers are `Ready`, anything else
    /// is `Invalid`.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            IndicatorSample::Ready(value)
        } else {
            IndicatorSample::Invalid
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            IndicatorSample::Ready(v) => Some(*v),
            IndicatorSample::NotReady | IndicatorSample::Invalid => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, IndicatorSample::Ready(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, IndicatorSample::Invalid)
    }
}

/// Index-aligned series of samples for one indicator over one bar series.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub samples: Vec<IndicatorSample>,
}

impl IndicatorSeries {
    /// Sample at `index`; out-of-range reads are `NotReady`.
    pub fn at(&self, index: usize) -> IndicatorSample {
        self.samples
            .get(index)
            .copied()
            .unwrap_or(IndicatorSample::NotReady)
    }

    pub fn invalid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_invalid()).count()
    }
}

/// Compute one indicator over the series.
pub fn compute(bars: &[Bar], kind: IndicatorKind) -> IndicatorSeries {
    match kind {
        IndicatorKind::Sma { window } => sma::calculate_sma(bars, window),
        IndicatorKind::Rsi { window } => rsi::calculate_rsi(bars, window),
        IndicatorKind::Volume => IndicatorSeries {
            kind,
            samples: bars
                .iter()
                .map(|b| IndicatorSample::from_value(b.volume as f64))
                .collect(),
        },
        IndicatorKind::Close => IndicatorSeries {
            kind,
            samples: bars
                .iter()
                .map(|b| IndicatorSample::from_value(b.close))
                .collect(),
        },
    }
}

/// Compute every requested indicator, keyed for per-bar lookup.
pub fn compute_all(
    bars: &[Bar],
    kinds: &[IndicatorKind],
) -> HashMap<IndicatorKind, IndicatorSeries> {
    kinds.iter().map(|&k| (k, compute(bars, k))).collect()
}
