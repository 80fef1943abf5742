//! Analyzer outputs shared by the gate, the scorer and the decision engine.
//!
//! Every analyzer is total: short or degenerate input maps to one of the
//! neutral values defined here instead of an error.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Why a session was not admitted as a tradeable day type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTypeRejection {
    InsufficientData,
    InsideDay,
    NarrowRange,
    Choppy,
}

impl DayTypeRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayTypeRejection::InsufficientData => "insufficient_data",
            DayTypeRejection::InsideDay => "inside_day",
            DayTypeRejection::NarrowRange => "narrow_range",
            DayTypeRejection::Choppy => "choppy",
        }
    }
}

/// Character of the current session, from 15-minute candles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "day_type", content = "reason", rename_all = "snake_case")]
pub enum DayType {
    Trend,
    TrapResolution,
    RangeExpansion,
    Rejected(DayTypeRejection),
}

impl DayType {
    /// Whether the market-regime gate admits this day type
    pub fn is_tradeable(&self) -> bool {
        !matches!(self, DayType::Rejected(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayType::Trend => "trend",
            DayType::TrapResolution => "trap_resolution",
            DayType::RangeExpansion => "range_expansion",
            DayType::Rejected(reason) => reason.as_str(),
        }
    }
}

/// Kind of price-structure event found on the 5-minute chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    BosDisplacement,
    TrapFailureRetest,
    RangeBreakFollowthrough,
    None,
}

impl StructureKind {
    /// Fixed quality awarded to each detector (0-30)
    pub fn quality(&self) -> u8 {
        match self {
            StructureKind::BosDisplacement => 30,
            StructureKind::TrapFailureRetest => 25,
            StructureKind::RangeBreakFollowthrough => 20,
            StructureKind::None => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StructureKind::BosDisplacement => "bos_displacement",
            StructureKind::TrapFailureRetest => "trap_failure_retest",
            StructureKind::RangeBreakFollowthrough => "range_break_followthrough",
            StructureKind::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureSignal {
    pub kind: StructureKind,
    /// 0-30
    pub quality: u8,
    pub direction: Direction,
    /// Price level that was broken or retested; 0.0 when nothing fired
    pub level: f64,
}

impl StructureSignal {
    pub fn none() -> Self {
        Self {
            kind: StructureKind::None,
            quality: 0,
            direction: Direction::Neutral,
            level: 0.0,
        }
    }

    pub fn new(kind: StructureKind, direction: Direction, level: f64) -> Self {
        Self {
            kind,
            quality: kind.quality(),
            direction,
            level,
        }
    }

    pub fn is_present(&self) -> bool {
        self.kind != StructureKind::None
    }
}

impl Default for StructureSignal {
    fn default() -> Self {
        Self::none()
    }
}

/// ATR level and trend for the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityState {
    pub current_atr: f64,
    pub median_atr: f64,
    /// ATR points per bar over the recent sub-window
    pub slope: f64,
    /// current_atr >= median_atr AND slope > 0
    pub expanding: bool,
    /// Number of ATR samples the state was computed from
    #[serde(default)]
    pub samples: usize,
}

impl VolatilityState {
    pub fn new(current_atr: f64, median_atr: f64, slope: f64) -> Self {
        Self {
            current_atr,
            median_atr,
            slope,
            expanding: current_atr > 0.0 && current_atr >= median_atr && slope > 0.0,
            samples: 0,
        }
    }

    pub fn neutral() -> Self {
        Self {
            current_atr: 0.0,
            median_atr: 0.0,
            slope: 0.0,
            expanding: false,
            samples: 0,
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// (current - median) / median, 0.0 when the median is degenerate
    pub fn expansion_ratio(&self) -> f64 {
        if self.median_atr <= 0.0 || !self.median_atr.is_finite() {
            return 0.0;
        }
        (self.current_atr - self.median_atr) / self.median_atr
    }
}

impl Default for VolatilityState {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumState {
    /// Projected underlying move in index points
    pub expected_index_move: f64,
    /// expected_index_move * option delta
    pub expected_premium: f64,
    pub body_percent: f64,
    pub follow_through: bool,
}

impl MomentumState {
    pub fn new(expected_index_move: f64, option_delta: f64, body_percent: f64, follow_through: bool) -> Self {
        let delta = if option_delta.is_finite() && option_delta > 0.0 {
            option_delta
        } else {
            0.0
        };
        Self {
            expected_index_move,
            expected_premium: expected_index_move * delta,
            body_percent,
            follow_through,
        }
    }

    pub fn neutral() -> Self {
        Self {
            expected_index_move: 0.0,
            expected_premium: 0.0,
            body_percent: 0.0,
            follow_through: false,
        }
    }
}

impl Default for MomentumState {
    fn default() -> Self {
        Self::neutral()
    }
}
