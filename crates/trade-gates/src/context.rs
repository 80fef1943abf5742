use analysis_core::{DayType, MomentumState, StructureSignal, VolatilityState};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option-chain metadata for the candidate strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeContext {
    pub strike_price: f64,
    pub atm_strike: f64,
    /// Absolute option delta; missing fails strike quality closed
    #[serde(default)]
    pub delta: Option<f64>,
    /// Bid-ask spread as a percentage of mid (0.6 = 0.6%)
    #[serde(default)]
    pub spread_pct: Option<f64>,
}

impl StrikeContext {
    /// |strike - ATM| / ATM in percent, `None` when ATM is not positive
    pub fn atm_distance_pct(&self) -> Option<f64> {
        if self.atm_strike.is_nan() || self.atm_strike <= 0.0 || !self.strike_price.is_finite() {
            return None;
        }
        Some((self.strike_price - self.atm_strike).abs() / self.atm_strike * 100.0)
    }
}

/// Per-lot risk estimate for the candidate trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContext {
    pub max_loss: Decimal,
    pub expected_win: Decimal,
}

impl RiskContext {
    pub fn new(max_loss: Decimal, expected_win: Decimal) -> Self {
        Self {
            max_loss,
            expected_win,
        }
    }
}

/// Snapshot evaluated by the gate and the scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateContext {
    pub day_type: DayType,
    pub structure: StructureSignal,
    pub volatility: VolatilityState,
    pub momentum: MomentumState,
    /// IST wall-clock time of the evaluation
    pub local_time: NaiveTime,
    pub strike: StrikeContext,
    pub risk: RiskContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atm_distance() {
        let strike = StrikeContext {
            strike_price: 22100.0,
            atm_strike: 22000.0,
            delta: Some(0.45),
            spread_pct: Some(0.5),
        };
        assert!((strike.atm_distance_pct().unwrap() - 0.4545).abs() < 1e-3);

        let zero_atm = StrikeContext {
            atm_strike: 0.0,
            ..strike
        };
        assert!(zero_atm.atm_distance_pct().is_none());
    }
}
