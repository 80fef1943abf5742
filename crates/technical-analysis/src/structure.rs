//! Price-structure detection on 5-minute candles.
//!
//! Three detectors run independently; the highest-priority one that fires
//! wins: break of structure with displacement, trap-failure retest, then
//! range break with follow-through.

use analysis_core::{Candle, CandleAnalyzer, Direction, StructureKind, StructureSignal};
use tracing::debug;

use crate::indicators::{average_range, high_low};

/// Candles used to define the prior swing / range
const SWING_LOOKBACK: usize = 10;
/// How far back a trap candle may sit before the retest
const TRAP_WINDOW: usize = 6;
/// Minimum body share of a displacement candle
const DISPLACEMENT_BODY: f64 = 0.6;
/// Displacement candle range vs. average lookback range
const DISPLACEMENT_RANGE_MULT: f64 = 1.5;
/// Retest tolerance as a fraction of average range
const RETEST_TOLERANCE: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    swing_lookback: usize,
    trap_window: usize,
}

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self {
            swing_lookback: SWING_LOOKBACK,
            trap_window: TRAP_WINDOW,
        }
    }

    /// Last candle closes through the prior swing with a wide, full-bodied candle.
    pub fn detect_bos_displacement(&self, candles: &[Candle]) -> Option<StructureSignal> {
        let n = candles.len();
        if n < self.swing_lookback + 1 {
            return None;
        }

        let last = &candles[n - 1];
        let lookback = &candles[n - 1 - self.swing_lookback..n - 1];
        let (swing_high, swing_low) = high_low(lookback)?;
        let avg_range = average_range(lookback);
        if avg_range <= 0.0 {
            return None;
        }

        let displaced = last.body_percent() >= DISPLACEMENT_BODY
            && last.range() >= DISPLACEMENT_RANGE_MULT * avg_range;
        if !displaced {
            return None;
        }

        if last.is_bullish() && last.close > swing_high {
            return Some(StructureSignal::new(
                StructureKind::BosDisplacement,
                Direction::Bullish,
                swing_high,
            ));
        }
        if last.is_bearish() && last.close < swing_low {
            return Some(StructureSignal::new(
                StructureKind::BosDisplacement,
                Direction::Bearish,
                swing_low,
            ));
        }

        None
    }

    /// A recent candle pierced the prior swing and closed back inside; the
    /// last candle retests that level and rejects it.
    pub fn detect_trap_failure_retest(&self, candles: &[Candle]) -> Option<StructureSignal> {
        let n = candles.len();
        if n < self.swing_lookback + 2 {
            return None;
        }

        let last = &candles[n - 1];
        let first_candidate = (n - 1).saturating_sub(self.trap_window).max(self.swing_lookback);

        // Most recent trap first
        for t in (first_candidate..n - 1).rev() {
            let trap = &candles[t];
            let prior = &candles[t - self.swing_lookback..t];
            let Some((swing_high, swing_low)) = high_low(prior) else {
                continue;
            };
            let tolerance = RETEST_TOLERANCE * average_range(prior);

            // Bull trap: failed breakout above, retest from below and reject
            if trap.high > swing_high
                && trap.close < swing_high
                && last.high >= swing_high - tolerance
                && last.is_bearish()
                && last.close < swing_high
            {
                return Some(StructureSignal::new(
                    StructureKind::TrapFailureRetest,
                    Direction::Bearish,
                    swing_high,
                ));
            }

            // Bear trap: failed breakdown below, retest from above and reject
            if trap.low < swing_low
                && trap.close > swing_low
                && last.low <= swing_low + tolerance
                && last.is_bullish()
                && last.close > swing_low
            {
                return Some(StructureSignal::new(
                    StructureKind::TrapFailureRetest,
                    Direction::Bullish,
                    swing_low,
                ));
            }
        }

        None
    }

    /// Second-to-last candle closes outside the prior range and the last
    /// candle closes further in the same direction.
    pub fn detect_range_break(&self, candles: &[Candle]) -> Option<StructureSignal> {
        let n = candles.len();
        if n < self.swing_lookback + 2 {
            return None;
        }

        let last = &candles[n - 1];
        let breakout = &candles[n - 2];
        let range = &candles[n - 2 - self.swing_lookback..n - 2];
        let (range_high, range_low) = high_low(range)?;

        if breakout.close > range_high && last.close > breakout.close {
            return Some(StructureSignal::new(
                StructureKind::RangeBreakFollowthrough,
                Direction::Bullish,
                range_high,
            ));
        }
        if breakout.close < range_low && last.close < breakout.close {
            return Some(StructureSignal::new(
                StructureKind::RangeBreakFollowthrough,
                Direction::Bearish,
                range_low,
            ));
        }

        None
    }
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleAnalyzer for StructureAnalyzer {
    type Output = StructureSignal;

    fn name(&self) -> &'static str {
        "structure"
    }

    fn min_candles(&self) -> usize {
        self.swing_lookback + 2
    }

    fn analyze(&self, candles: &[Candle]) -> StructureSignal {
        if candles.len() < self.min_candles() {
            return StructureSignal::none();
        }

        let signal = self
            .detect_bos_displacement(candles)
            .or_else(|| self.detect_trap_failure_retest(candles))
            .or_else(|| self.detect_range_break(candles))
            .unwrap_or_else(StructureSignal::none);

        debug!(
            kind = signal.kind.as_str(),
            quality = signal.quality,
            direction = ?signal.direction,
            "structure analyzed"
        );
        signal
    }
}
