use analysis_core::session::latest_session;
use analysis_core::stats::{mean, safe_div};
use analysis_core::{Candle, CandleAnalyzer, DayType, DayTypeRejection};
use log::debug;
use serde::{Deserialize, Serialize};

/// Session metrics behind a day-type classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Session range as percentage of the session open
    pub range_percent: f64,

    /// Opening range (first two candles) high
    pub opening_range_high: f64,

    /// Opening range low
    pub opening_range_low: f64,

    /// Net move / path length, 0.0 to 1.0
    pub efficiency: f64,

    /// Net move / session range, 0.0 to 1.0
    pub net_move_share: f64,

    /// Latest candle range vs. average of the preceding candles
    pub last_range_ratio: f64,

    /// Number of session candles analyzed
    pub sample_size: usize,
}

/// Classification result with the metrics that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayTypeReport {
    pub day_type: DayType,
    pub metrics: SessionMetrics,
    pub reasoning: String,
}

/// Labels the session's character from 15-minute candles.
///
/// Only the latest session's candles are considered. Rules run in order:
/// narrow range, inside day, trap resolution, trend, range expansion, and
/// anything left over is choppy.
pub struct DayTypeClassifier {
    /// Minimum session candles required for analysis
    min_candles: usize,

    /// Candles forming the opening range
    opening_range_candles: usize,

    /// Session range below this share of the open is a narrow day
    narrow_range_percent: f64,

    /// Overshoot of the opening range still counted as inside
    inside_tolerance: f64,

    trend_efficiency: f64,
    trend_net_move_share: f64,
    expansion_range_mult: f64,
}

impl DayTypeClassifier {
    pub fn new() -> Self {
        Self {
            min_candles: 4,
            opening_range_candles: 2,
            narrow_range_percent: 0.35,
            inside_tolerance: 0.10,
            trend_efficiency: 0.6,
            trend_net_move_share: 0.5,
            expansion_range_mult: 1.5,
        }
    }

    pub fn classify(&self, candles_15m: &[Candle]) -> DayType {
        self.classify_detailed(candles_15m).day_type
    }

    pub fn classify_detailed(&self, candles_15m: &[Candle]) -> DayTypeReport {
        let session = latest_session(candles_15m);
        if session.len() < self.min_candles {
            return DayTypeReport {
                day_type: DayType::Rejected(DayTypeRejection::InsufficientData),
                metrics: SessionMetrics {
                    sample_size: session.len(),
                    ..SessionMetrics::default()
                },
                reasoning: format!(
                    "Insufficient data: {} candles (need {})",
                    session.len(),
                    self.min_candles
                ),
            };
        }

        let metrics = self.calculate_metrics(session);
        let day_type = self.classify_session(session, &metrics);

        let reasoning = format!(
            "{} (range: {:.2}%, efficiency: {:.2}, net share: {:.2}, last range x{:.2})",
            day_type.label(),
            metrics.range_percent,
            metrics.efficiency,
            metrics.net_move_share,
            metrics.last_range_ratio
        );
        debug!("Day type classified: {}", reasoning);

        DayTypeReport {
            day_type,
            metrics,
            reasoning,
        }
    }

    fn calculate_metrics(&self, session: &[Candle]) -> SessionMetrics {
        let first = &session[0];
        let last = &session[session.len() - 1];

        let high = session.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = session.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let range = high - low;

        let opening = &session[..self.opening_range_candles.min(session.len())];
        let or_high = opening.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let or_low = opening.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

        let net_move = (last.close - first.open).abs();
        let path: f64 = (first.close - first.open).abs()
            + session
                .windows(2)
                .map(|w| (w[1].close - w[0].close).abs())
                .sum::<f64>();

        let prior_ranges: Vec<f64> = session[..session.len() - 1].iter().map(Candle::range).collect();

        SessionMetrics {
            range_percent: safe_div(range, first.open) * 100.0,
            opening_range_high: or_high,
            opening_range_low: or_low,
            efficiency: safe_div(net_move, path),
            net_move_share: safe_div(net_move, range),
            last_range_ratio: safe_div(last.range(), mean(&prior_ranges)),
            sample_size: session.len(),
        }
    }

    fn classify_session(&self, session: &[Candle], metrics: &SessionMetrics) -> DayType {
        if metrics.range_percent < self.narrow_range_percent {
            return DayType::Rejected(DayTypeRejection::NarrowRange);
        }

        let or_high = metrics.opening_range_high;
        let or_low = metrics.opening_range_low;
        let tolerance = (or_high - or_low) * self.inside_tolerance;
        let rest = &session[self.opening_range_candles.min(session.len())..];
        let last = &session[session.len() - 1];

        let inside = rest.iter().all(|c| {
            c.close <= or_high
                && c.close >= or_low
                && c.high <= or_high + tolerance
                && c.low >= or_low - tolerance
        });
        if inside {
            return DayType::Rejected(DayTypeRejection::InsideDay);
        }

        // Failed pierce of one side, then resolution through the other
        let before_last = &rest[..rest.len().saturating_sub(1)];
        let failed_up = before_last.iter().any(|c| c.high > or_high && c.close <= or_high);
        let failed_down = before_last.iter().any(|c| c.low < or_low && c.close >= or_low);
        if (failed_up && last.close < or_low) || (failed_down && last.close > or_high) {
            return DayType::TrapResolution;
        }

        if metrics.efficiency >= self.trend_efficiency
            && metrics.net_move_share >= self.trend_net_move_share
        {
            return DayType::Trend;
        }

        let outside = last.close > or_high || last.close < or_low;
        if outside && metrics.last_range_ratio >= self.expansion_range_mult {
            return DayType::RangeExpansion;
        }

        DayType::Rejected(DayTypeRejection::Choppy)
    }
}

impl Default for DayTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleAnalyzer for DayTypeClassifier {
    type Output = DayType;

    fn name(&self) -> &'static str {
        "day_type"
    }

    fn min_candles(&self) -> usize {
        self.min_candles
    }

    fn analyze(&self, candles: &[Candle]) -> DayType {
        self.classify(candles)
    }
}
