use analysis_core::session::session_start;
use analysis_core::stats::{linear_slope, median};
use analysis_core::{Candle, CandleAnalyzer, VolatilityState};
use tracing::debug;

use crate::indicators::atr;

const ATR_PERIOD: usize = 14;
const SLOPE_WINDOW: usize = 5;
const MIN_ATR_SAMPLES: usize = 3;

/// Session ATR level and trend.
///
/// `median_atr` is taken over the ATR samples that fall inside the latest
/// session (from 09:15 IST); earlier candles only warm the average up.
#[derive(Debug, Clone)]
pub struct VolatilityAnalyzer {
    atr_period: usize,
    slope_window: usize,
}

impl VolatilityAnalyzer {
    pub fn new() -> Self {
        Self {
            atr_period: ATR_PERIOD,
            slope_window: SLOPE_WINDOW,
        }
    }
}

impl Default for VolatilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleAnalyzer for VolatilityAnalyzer {
    type Output = VolatilityState;

    fn name(&self) -> &'static str {
        "volatility"
    }

    fn min_candles(&self) -> usize {
        self.atr_period + MIN_ATR_SAMPLES
    }

    fn analyze(&self, candles: &[Candle]) -> VolatilityState {
        let series = atr(candles, self.atr_period);
        if series.len() < MIN_ATR_SAMPLES {
            return VolatilityState::neutral().with_samples(series.len());
        }

        let current_atr = series[series.len() - 1];

        // series[k] belongs to candles[k + atr_period]; with no session
        // candle yet the whole warm-up series is used
        let session_series = match session_start(candles) {
            Some(start) => &series[start.saturating_sub(self.atr_period)..],
            None => &series[..],
        };
        let median_atr = median(session_series);

        let recent = &series[series.len().saturating_sub(self.slope_window)..];
        let slope = linear_slope(recent);

        let state = VolatilityState::new(current_atr, median_atr, slope).with_samples(series.len());
        debug!(
            current_atr = state.current_atr,
            median_atr = state.median_atr,
            slope = state.slope,
            expanding = state.expanding,
            "volatility analyzed"
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::stats::median;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Candles centred on 100 whose range changes by `step` per candle,
    /// starting 09:15 IST.
    fn candles_with_ranges(count: usize, start_range: f64, step: f64) -> Vec<Candle> {
        let open = Utc.with_ymd_and_hms(2024, 3, 5, 3, 45, 0).unwrap();
        candles_from(open, count, start_range, step)
    }

    fn candles_from(open: DateTime<Utc>, count: usize, start_range: f64, step: f64) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let half = (start_range + step * i as f64).max(0.0) / 2.0;
                Candle {
                    timestamp: open + Duration::minutes(5 * i as i64),
                    open: 100.0,
                    high: 100.0 + half,
                    low: 100.0 - half,
                    close: 100.0,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_insufficient_samples_is_neutral() {
        let analyzer = VolatilityAnalyzer::new();
        let state = analyzer.analyze(&candles_with_ranges(10, 2.0, 0.1));
        assert!(!state.expanding);
        assert_eq!(state.current_atr, 0.0);
        assert_eq!(state.median_atr, 0.0);
        assert_eq!(state.slope, 0.0);
        assert!(!analyzer.analyze(&[]).expanding);
    }

    #[test]
    fn test_rising_ranges_are_expanding() {
        let state = VolatilityAnalyzer::new().analyze(&candles_with_ranges(40, 2.0, 0.2));
        assert!(state.current_atr > state.median_atr);
        assert!(state.slope > 0.0);
        assert!(state.expanding);
        assert_eq!(state.samples, 40 - 14);
    }

    #[test]
    fn test_falling_ranges_are_not_expanding() {
        let state = VolatilityAnalyzer::new().analyze(&candles_with_ranges(40, 10.0, -0.2));
        assert!(state.slope < 0.0);
        assert!(state.current_atr < state.median_atr);
        assert!(!state.expanding);
    }

    #[test]
    fn test_constant_ranges_have_flat_slope() {
        let state = VolatilityAnalyzer::new().analyze(&candles_with_ranges(30, 4.0, 0.0));
        assert!((state.current_atr - 4.0).abs() < 1e-9);
        assert!(state.slope.abs() < 1e-9);
        assert!(!state.expanding);
    }

    #[test]
    fn test_zero_range_candles_do_not_expand() {
        let state = VolatilityAnalyzer::new().analyze(&candles_with_ranges(30, 0.0, 0.0));
        assert_eq!(state.current_atr, 0.0);
        assert!(!state.expanding);
    }

    #[test]
    fn test_pre_open_candles_use_full_series_median() {
        // 07:30-09:05 IST, nothing from today's session yet
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap();
        let candles = candles_from(start, 20, 2.0, 0.2);
        let series = atr(&candles, 14);

        let state = VolatilityAnalyzer::new().analyze(&candles);
        assert_eq!(state.samples, 6);
        assert!((state.median_atr - median(&series)).abs() < 1e-9);
        assert!(state.median_atr < state.current_atr);
        assert!(state.expanding);
    }

    #[test]
    fn test_median_ignores_previous_session_samples() {
        // yesterday's wide bars, then today's narrow ones from 09:15
        let yesterday = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        let mut candles = candles_from(yesterday, 16, 20.0, 0.0);
        candles.extend(candles_with_ranges(10, 2.0, 0.0));

        let state = VolatilityAnalyzer::new().analyze(&candles);
        let series = atr(&candles, 14);
        assert!((state.median_atr - median(&series[16 - 14..])).abs() < 1e-9);
        assert!(state.median_atr < median(&series));
    }
}
