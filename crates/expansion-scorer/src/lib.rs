//! Expansion confidence score (0-100).
//!
//! Seven independently clamped components summed into a single total:
//!
//! | component              | band |
//! |------------------------|------|
//! | structure_quality      | 0-30 |
//! | volatility_expansion   | 0-20 |
//! | momentum_quality       | 0-15 |
//! | time_advantage         | 0-10 |
//! | strike_responsiveness  | 0-10 |
//! | trap_liquidity_context | 0-10 |
//! | expected_move_buffer   | 0-5  |

use analysis_core::stats::{safe_div, unit};
use analysis_core::StructureKind;
use serde::{Deserialize, Serialize};
use trade_gates::{GateContext, TimeWindow};
use tracing::debug;

pub const STRUCTURE_MAX: f64 = 30.0;
pub const VOLATILITY_MAX: f64 = 20.0;
pub const MOMENTUM_MAX: f64 = 15.0;
pub const TIME_MAX: f64 = 10.0;
pub const STRIKE_MAX: f64 = 10.0;
pub const TRAP_MAX: f64 = 10.0;
pub const BUFFER_MAX: f64 = 5.0;

// volatility_expansion split
const VOL_RATIO_POINTS: f64 = 14.0;
const VOL_SLOPE_POINTS: f64 = 6.0;
/// ATR 25% above median earns the full ratio points
const VOL_RATIO_FULL: f64 = 0.25;
/// Slope of 10% of current ATR per bar earns the full slope points
const VOL_SLOPE_FULL: f64 = 0.1;

// momentum_quality split
const BODY_POINTS: f64 = 10.0;
const FOLLOW_THROUGH_BONUS: f64 = 5.0;
const BODY_FLOOR: f64 = 0.3;
const BODY_SPAN: f64 = 0.4;

const DELTA_MIDPOINT: f64 = 0.475;
const DELTA_HALF_BAND: f64 = 0.075;

const PREMIUM_THRESHOLD: f64 = 12.0;
/// Premium 50% above threshold earns the full buffer
const PREMIUM_BUFFER_FULL: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structure_quality: f64,
    pub volatility_expansion: f64,
    pub momentum_quality: f64,
    pub time_advantage: f64,
    pub strike_responsiveness: f64,
    pub trap_liquidity_context: f64,
    pub expected_move_buffer: f64,
    /// Clamped sum, rounded
    pub total: u32,
}

impl ScoreBreakdown {
    /// (name, value, band max) for each component
    pub fn components(&self) -> [(&'static str, f64, f64); 7] {
        [
            ("structure_quality", self.structure_quality, STRUCTURE_MAX),
            ("volatility_expansion", self.volatility_expansion, VOLATILITY_MAX),
            ("momentum_quality", self.momentum_quality, MOMENTUM_MAX),
            ("time_advantage", self.time_advantage, TIME_MAX),
            ("strike_responsiveness", self.strike_responsiveness, STRIKE_MAX),
            ("trap_liquidity_context", self.trap_liquidity_context, TRAP_MAX),
            ("expected_move_buffer", self.expected_move_buffer, BUFFER_MAX),
        ]
    }
}

/// Deterministic weighted scorer over a gate context.
#[derive(Debug, Clone)]
pub struct ExpansionScorer {
    windows: Vec<TimeWindow>,
}

impl ExpansionScorer {
    pub fn new(windows: Vec<TimeWindow>) -> Self {
        Self { windows }
    }

    pub fn score(&self, ctx: &GateContext) -> ScoreBreakdown {
        let structure_quality = band(ctx.structure.quality as f64, STRUCTURE_MAX);

        let v = &ctx.volatility;
        let ratio_part = unit(v.expansion_ratio() / VOL_RATIO_FULL) * VOL_RATIO_POINTS;
        let slope_part = unit(safe_div(v.slope, VOL_SLOPE_FULL * v.current_atr)) * VOL_SLOPE_POINTS;
        let volatility_expansion = if v.median_atr > 0.0 {
            band(ratio_part + slope_part, VOLATILITY_MAX)
        } else {
            0.0
        };

        let m = &ctx.momentum;
        let body_part = unit((m.body_percent - BODY_FLOOR) / BODY_SPAN) * BODY_POINTS;
        let follow_part = if m.follow_through { FOLLOW_THROUGH_BONUS } else { 0.0 };
        let momentum_quality = band(body_part + follow_part, MOMENTUM_MAX);

        let time_advantage = band(
            self.windows
                .iter()
                .map(|w| w.centrality(ctx.local_time))
                .fold(0.0, f64::max)
                * TIME_MAX,
            TIME_MAX,
        );

        let strike_responsiveness = match ctx.strike.delta {
            Some(delta) if delta.is_finite() => band(
                (1.0 - (delta - DELTA_MIDPOINT).abs() / DELTA_HALF_BAND) * STRIKE_MAX,
                STRIKE_MAX,
            ),
            _ => 0.0,
        };

        let trap_liquidity_context = if ctx.structure.kind == StructureKind::TrapFailureRetest {
            TRAP_MAX
        } else {
            0.0
        };

        let margin = safe_div(m.expected_premium - PREMIUM_THRESHOLD, PREMIUM_THRESHOLD);
        let expected_move_buffer = band(unit(margin / PREMIUM_BUFFER_FULL) * BUFFER_MAX, BUFFER_MAX);

        let sum = structure_quality
            + volatility_expansion
            + momentum_quality
            + time_advantage
            + strike_responsiveness
            + trap_liquidity_context
            + expected_move_buffer;
        let total = sum.clamp(0.0, 100.0).round() as u32;

        let breakdown = ScoreBreakdown {
            structure_quality,
            volatility_expansion,
            momentum_quality,
            time_advantage,
            strike_responsiveness,
            trap_liquidity_context,
            expected_move_buffer,
            total,
        };
        debug!(total, ?breakdown, "expansion score");
        breakdown
    }
}

impl Default for ExpansionScorer {
    fn default() -> Self {
        Self::new(TimeWindow::defaults())
    }
}

fn band(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
