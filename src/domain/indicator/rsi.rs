//! RSI (Relative Strength Index).
//!
//! Wilder's smoothing for average gain/loss:
//! - First average: simple mean over the first `window` changes
//! - Subsequent: avg = (prev_avg * (window - 1) + current) / window
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); avg_loss == 0 saturates
//! at 100. Warmup: indices below `window` are NotReady (the first `window`
//! close-to-close changes are needed for the seed average).

use crate::domain::ast::IndicatorKind;
use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorSample, IndicatorSeries};

pub fn calculate_rsi(bars: &[Bar], window: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Rsi { window };
    if window == 0 || bars.len() < 2 {
        return IndicatorSeries {
            kind,
            samples: vec![IndicatorSample::NotReady; bars.len()],
        };
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        if change.is_finite() {
            gains.push(if change > 0.0 { change } else { 0.0 });
            losses.push(if change < 0.0 { -change } else { 0.0 });
        } else {
            // Keep the contamination visible; a comparison against NaN would
            // otherwise classify a broken bar as a flat change.
            gains.push(f64::NAN);
            losses.push(f64::NAN);
        }
    }

    let mut samples = Vec::with_capacity(bars.len());
    samples.push(IndicatorSample::NotReady);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..bars.len() {
        let change_idx = i - 1;
        if change_idx + 1 < window {
            samples.push(IndicatorSample::NotReady);
        } else if change_idx + 1 == window {
            avg_gain = gains[..window].iter().sum::<f64>() / window as f64;
            avg_loss = losses[..window].iter().sum::<f64>() / window as f64;
            samples.push(rsi_sample(avg_gain, avg_loss));
        } else {
            avg_gain = (avg_gain * (window - 1) as f64 + gains[change_idx]) / window as f64;
            avg_loss = (avg_loss * (window - 1) as f64 + losses[change_idx]) / window as f64;
            samples.push(rsi_sample(avg_gain, avg_loss));
        }
    }

    IndicatorSeries { kind, samples }
}

fn rsi_sample(avg_gain: f64, avg_loss: f64) -> IndicatorSample {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return IndicatorSample::Invalid;
    }
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    IndicatorSample::from_value(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i as u32 + 1, c))
            .collect()
    }

    #[test]
    fn rsi_empty_and_single_bar() {
        assert!(calculate_rsi(&[], 14).samples.is_empty());

        let series = calculate_rsi(&bars_from_closes(&[100.0]), 14);
        assert_eq!(series.samples.len(), 1);
        assert_eq!(series.at(0), IndicatorSample::NotReady);
    }

    #[test]
    fn rsi_warmup_boundary() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + (i % 5) as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);

        assert_eq!(series.samples.len(), 16);
        for i in 0..14 {
            assert_eq!(series.at(i), IndicatorSample::NotReady, "index {}", i);
        }
        assert!(series.at(14).is_ready());
        assert!(series.at(15).is_ready());
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert_eq!(series.at(14).value(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_saturates_at_0() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert_eq!(series.at(14).value(), Some(0.0));
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);

        for sample in &series.samples {
            if let Some(rsi) = sample.value() {
                assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
            }
        }
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // Constant +1 steps: seed avg_gain = 1, avg_loss = 0, RSI pinned at 100.
        let closes: Vec<f64> = (0..6).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 3);
        assert_eq!(series.at(3).value(), Some(100.0));
        assert_eq!(series.at(5).value(), Some(100.0));
    }

    #[test]
    fn rsi_zero_window_never_ready() {
        let series = calculate_rsi(&bars_from_closes(&[100.0, 101.0]), 0);
        assert!(series.samples.iter().all(|s| *s == IndicatorSample::NotReady));
    }

    #[test]
    fn rsi_nan_close_marks_invalid() {
        let mut bars = bars_from_closes(&(0..8).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        bars[4].close = f64::NAN;
        let series = calculate_rsi(&bars, 3);

        // The NaN change contaminates the smoothed averages from the bar it
        // first enters them; those samples must be Invalid, never numeric.
        assert!(series.samples.iter().skip(4).all(|s| !s.is_ready()));
        assert!(series.invalid_count() > 0);
    }
}
