//! Simple moving average.
//!
//! Mean of the last `window` closes. Warmup: indices below `window - 1` are
//! NotReady. Each window is summed directly so a single bad close only
//! poisons the windows that contain it.

use crate::domain::ast::IndicatorKind;
use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorSample, IndicatorSeries};

pub fn calculate_sma(bars: &[Bar], window: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Sma { window };
    if window == 0 {
        return IndicatorSeries {
            kind,
            samples: vec![IndicatorSample::NotReady; bars.len()],
        };
    }

    let mut samples = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i + 1 < window {
            samples.push(IndicatorSample::NotReady);
        } else {
            let sum: f64 = bars[i + 1 - window..=i].iter().map(|b| b.close).sum();
            samples.push(IndicatorSample::from_value(sum / window as f64));
        }
    }

    IndicatorSeries { kind, samples }
}
