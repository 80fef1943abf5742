use analysis_core::{Candle, MomentumState};
use tracing::debug;

use crate::indicators::{atr, trailing_body_percent};

const ATR_PERIOD: usize = 14;
/// ATR samples back used for the trajectory ratio
const TRAJECTORY_LOOKBACK: usize = 3;
/// Projected move in ATR multiples
const PROJECTION_ATR_MULT: f64 = 2.0;
const TRAJECTORY_MIN: f64 = 0.5;
const TRAJECTORY_MAX: f64 = 1.5;
const BODY_WINDOW: usize = 3;
/// Candles before the latest searched for an impulse
const IMPULSE_WINDOW: usize = 6;
const IMPULSE_BODY: f64 = 0.6;
const IMPULSE_RANGE_ATR: f64 = 1.2;
/// Follow-through displacement in ATR multiples
const FOLLOW_THROUGH_ATR: f64 = 0.25;

/// Expected move / premium and candle strength.
#[derive(Debug, Clone, Default)]
pub struct MomentumAnalyzer;

impl MomentumAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn min_candles(&self) -> usize {
        ATR_PERIOD + TRAJECTORY_LOOKBACK + 1
    }

    pub fn analyze(&self, candles: &[Candle], option_delta: f64) -> MomentumState {
        let series = atr(candles, ATR_PERIOD);
        if series.len() <= TRAJECTORY_LOOKBACK {
            return MomentumState::neutral();
        }

        let current_atr = series[series.len() - 1];
        let past_atr = series[series.len() - 1 - TRAJECTORY_LOOKBACK];
        let trajectory = if past_atr > 0.0 {
            (current_atr / past_atr).clamp(TRAJECTORY_MIN, TRAJECTORY_MAX)
        } else {
            1.0
        };

        let expected_index_move = current_atr * PROJECTION_ATR_MULT * trajectory;
        let body_percent = trailing_body_percent(candles, BODY_WINDOW);
        let follow_through = detect_follow_through(candles, current_atr);

        let state = MomentumState::new(expected_index_move, option_delta, body_percent, follow_through);
        debug!(
            expected_index_move = state.expected_index_move,
            expected_premium = state.expected_premium,
            body_percent = state.body_percent,
            follow_through = state.follow_through,
            "momentum analyzed"
        );
        state
    }
}

/// Whether the latest close extends the most recent impulse candle.
pub fn detect_follow_through(candles: &[Candle], atr: f64) -> bool {
    let n = candles.len();
    if n < 2 || atr <= 0.0 {
        return false;
    }

    let last = &candles[n - 1];
    let start = (n - 1).saturating_sub(IMPULSE_WINDOW);

    let impulse = candles[start..n - 1]
        .iter()
        .rev()
        .find(|c| c.body_percent() >= IMPULSE_BODY && c.range() >= IMPULSE_RANGE_ATR * atr);

    match impulse {
        Some(c) => {
            let sign = c.direction().sign();
            sign != 0.0 && (last.close - c.close) * sign >= FOLLOW_THROUGH_ATR * atr
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 3, 45, 0).unwrap() + Duration::minutes(5 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    /// Each candle gains 5 points with a 4 point body and 5 point range.
    fn steady_trend(count: usize) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let open = 100.0 + 5.0 * i as f64;
                candle(i, open, open + 4.5, open - 0.5, open + 4.0)
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history_is_neutral() {
        let analyzer = MomentumAnalyzer::new();
        assert_eq!(analyzer.analyze(&steady_trend(10), 0.5), MomentumState::neutral());
        assert_eq!(analyzer.analyze(&[], 0.5), MomentumState::neutral());
        assert_eq!(analyzer.min_candles(), 18);
    }

    #[test]
    fn test_steady_trend_projection() {
        let state = MomentumAnalyzer::new().analyze(&steady_trend(30), 0.5);

        // true range is 5.5 on every candle, trajectory flat
        assert!((state.expected_index_move - 11.0).abs() < 1e-9);
        assert!((state.expected_premium - 5.5).abs() < 1e-9);
        assert!((state.body_percent - 0.8).abs() < 1e-9);
        assert!(!state.follow_through);
    }

    #[test]
    fn test_follow_through_after_impulse() {
        let mut candles = steady_trend(30);
        let base = candles[29].close;
        candles.push(candle(30, base, base + 9.5, base - 0.5, base + 9.0));
        candles.push(candle(31, base + 9.0, base + 14.5, base + 8.5, base + 14.0));

        let state = MomentumAnalyzer::new().analyze(&candles, 0.5);
        assert!(state.follow_through);
        assert!(state.expected_premium > 0.0);
    }

    #[test]
    fn test_reversal_after_impulse_is_not_follow_through() {
        let mut candles = steady_trend(30);
        let base = candles[29].close;
        candles.push(candle(30, base, base + 9.5, base - 0.5, base + 9.0));
        candles.push(candle(31, base + 9.0, base + 9.2, base + 3.0, base + 4.0));

        let state = MomentumAnalyzer::new().analyze(&candles, 0.5);
        assert!(!state.follow_through);
    }

    #[test]
    fn test_flat_candles_do_not_divide_by_zero() {
        let candles: Vec<Candle> = (0..30).map(|i| candle(i, 100.0, 100.0, 100.0, 100.0)).collect();
        let state = MomentumAnalyzer::new().analyze(&candles, 0.5);
        assert_eq!(state.expected_index_move, 0.0);
        assert_eq!(state.body_percent, 0.0);
        assert!(!state.follow_through);
    }
}
