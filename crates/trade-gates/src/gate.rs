use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::context::{GateContext, RiskContext, StrikeContext};
use crate::report::{GateName, GateReport, GateResult};
use crate::window::TimeWindow;

/// Pass thresholds for the eight gates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateThresholds {
    /// Admissible IST windows for gate B
    pub windows: Vec<TimeWindow>,
    /// Gate E floor on expected premium
    pub min_momentum_premium: f64,
    /// Gate G floor on expected premium
    pub min_expected_premium: f64,
    pub delta_min: f64,
    pub delta_max: f64,
    /// Spread must be strictly below this percentage
    pub max_spread_pct: f64,
    pub max_atm_distance_pct: f64,
    /// Gate H: max_loss <= ratio * expected_win
    pub max_loss_to_win: Decimal,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            windows: TimeWindow::defaults(),
            min_momentum_premium: 4.0,
            min_expected_premium: 12.0,
            delta_min: 0.40,
            delta_max: 0.55,
            max_spread_pct: 1.0,
            max_atm_distance_pct: 1.0,
            max_loss_to_win: Decimal::new(15, 1),
        }
    }
}

impl GateThresholds {
    pub fn with_windows(windows: Vec<TimeWindow>) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }
}

/// Runs all eight admission gates.
#[derive(Debug, Clone, Default)]
pub struct PreTradeGate {
    thresholds: GateThresholds,
}

impl PreTradeGate {
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate every gate. Never short-circuits.
    pub fn run(&self, ctx: &GateContext) -> GateReport {
        let results = vec![
            self.market_regime(ctx),
            self.time_window(ctx.local_time),
            self.structure(ctx),
            self.volatility(ctx),
            self.momentum_timing(ctx),
            self.strike_quality(&ctx.strike),
            self.expected_move(ctx),
            self.risk_feasibility(&ctx.risk),
        ];

        let report = GateReport::new(results);
        debug!(
            allowed = report.allowed(),
            gates = %report.summary(),
            "pre-trade gates evaluated"
        );
        report
    }

    fn market_regime(&self, ctx: &GateContext) -> GateResult {
        GateResult::new(
            GateName::MarketRegime,
            ctx.day_type.is_tradeable(),
            json!({ "day_type": ctx.day_type.label() }),
        )
    }

    fn time_window(&self, time: NaiveTime) -> GateResult {
        let active = self.thresholds.windows.iter().find(|w| w.contains(time));
        GateResult::new(
            GateName::TimeWindow,
            active.is_some(),
            json!({
                "local_time": time.format("%H:%M:%S").to_string(),
                "window": active.map(|w| w.to_string()),
                "windows": self.thresholds.windows.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            }),
        )
    }

    fn structure(&self, ctx: &GateContext) -> GateResult {
        GateResult::new(
            GateName::Structure,
            ctx.structure.is_present(),
            json!({
                "kind": ctx.structure.kind.as_str(),
                "quality": ctx.structure.quality,
                "direction": ctx.structure.direction,
            }),
        )
    }

    fn volatility(&self, ctx: &GateContext) -> GateResult {
        let v = &ctx.volatility;
        GateResult::new(
            GateName::Volatility,
            v.expanding,
            json!({
                "current_atr": v.current_atr,
                "median_atr": v.median_atr,
                "slope": v.slope,
                "expanding": v.expanding,
            }),
        )
    }

    fn momentum_timing(&self, ctx: &GateContext) -> GateResult {
        let premium = ctx.momentum.expected_premium;
        GateResult::new(
            GateName::MomentumTiming,
            premium >= self.thresholds.min_momentum_premium,
            json!({
                "expected_premium": premium,
                "min_premium": self.thresholds.min_momentum_premium,
            }),
        )
    }

    fn strike_quality(&self, strike: &StrikeContext) -> GateResult {
        let t = &self.thresholds;
        let delta_ok = strike
            .delta
            .map(|d| d >= t.delta_min && d <= t.delta_max)
            .unwrap_or(false);
        let spread_ok = strike
            .spread_pct
            .map(|s| s >= 0.0 && s < t.max_spread_pct)
            .unwrap_or(false);
        let distance = strike.atm_distance_pct();
        let distance_ok = distance.map(|d| d <= t.max_atm_distance_pct).unwrap_or(false);

        GateResult::new(
            GateName::StrikeQuality,
            delta_ok && spread_ok && distance_ok,
            json!({
                "delta": strike.delta,
                "delta_ok": delta_ok,
                "spread_pct": strike.spread_pct,
                "spread_ok": spread_ok,
                "atm_distance_pct": distance,
                "atm_distance_ok": distance_ok,
            }),
        )
    }

    fn expected_move(&self, ctx: &GateContext) -> GateResult {
        let premium = ctx.momentum.expected_premium;
        GateResult::new(
            GateName::ExpectedMove,
            premium >= self.thresholds.min_expected_premium,
            json!({
                "expected_premium": premium,
                "expected_index_move": ctx.momentum.expected_index_move,
                "min_premium": self.thresholds.min_expected_premium,
            }),
        )
    }

    fn risk_feasibility(&self, risk: &RiskContext) -> GateResult {
        // None: the limit exceeds Decimal range, so any finite loss fits
        let limit = risk.expected_win.checked_mul(self.thresholds.max_loss_to_win);
        let passed = risk.expected_win > Decimal::ZERO
            && risk.max_loss >= Decimal::ZERO
            && limit.map_or(true, |limit| risk.max_loss <= limit);
        GateResult::new(
            GateName::RiskFeasibility,
            passed,
            json!({
                "max_loss": risk.max_loss,
                "expected_win": risk.expected_win,
                "max_allowed_loss": limit,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{
        DayType, DayTypeRejection, Direction, MomentumState, StructureKind, StructureSignal,
        VolatilityState,
    };
    use rust_decimal_macros::dec;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn passing_context() -> GateContext {
        GateContext {
            day_type: DayType::Trend,
            structure: StructureSignal::new(StructureKind::BosDisplacement, Direction::Bullish, 22050.0),
            volatility: VolatilityState::new(45.2, 35.2, 5.3),
            momentum: MomentumState {
                expected_index_move: 31.67,
                expected_premium: 15.2,
                body_percent: 0.75,
                follow_through: true,
            },
            local_time: t(11, 30),
            strike: StrikeContext {
                strike_price: 22100.0,
                atm_strike: 22050.0,
                delta: Some(0.48),
                spread_pct: Some(0.6),
            },
            risk: RiskContext::new(dec!(1200), dec!(2400)),
        }
    }

    #[test]
    fn test_all_gates_pass() {
        let report = PreTradeGate::default().run(&passing_context());
        assert!(report.allowed());
        assert!(report.failed_gates().is_empty());
        assert_eq!(report.len(), 8);
    }

    #[test]
    fn test_report_is_complete_and_ordered_when_failing() {
        let mut ctx = passing_context();
        ctx.day_type = DayType::Rejected(DayTypeRejection::Choppy);
        ctx.structure = StructureSignal::none();
        ctx.momentum = MomentumState::neutral();

        let report = PreTradeGate::default().run(&ctx);
        assert_eq!(report.len(), 8);
        let names: Vec<GateName> = report.results().iter().map(|r| r.name).collect();
        assert_eq!(names, GateName::ALL.to_vec());
        assert!(!report.allowed());
        assert_eq!(
            report.failed_gates(),
            vec!["market_regime", "structure", "momentum_timing", "expected_move"]
        );
    }

    #[test]
    fn test_outside_window_and_contracting_volatility() {
        let mut ctx = passing_context();
        ctx.local_time = t(14, 0);
        ctx.volatility = VolatilityState::new(30.0, 35.2, -1.0);

        let report = PreTradeGate::default().run(&ctx);
        assert!(!report.allowed());
        let failed = report.failed_gates();
        assert!(failed.contains(&"time_window"));
        assert!(failed.contains(&"volatility"));
    }

    #[test]
    fn test_window_edges() {
        let gate = PreTradeGate::default();
        let mut ctx = passing_context();
        for (time, expected) in [
            (t(10, 29), false),
            (t(10, 30), true),
            (t(13, 0), false),
            (t(13, 45), true),
            (t(14, 29), true),
            (t(14, 30), false),
        ] {
            ctx.local_time = time;
            assert_eq!(gate.run(&ctx).passed(GateName::TimeWindow), expected, "{}", time);
        }
    }

    #[test]
    fn test_momentum_and_expected_move_thresholds() {
        let gate = PreTradeGate::default();
        let mut ctx = passing_context();

        ctx.momentum.expected_premium = 8.0;
        let report = gate.run(&ctx);
        assert!(report.passed(GateName::MomentumTiming));
        assert!(!report.passed(GateName::ExpectedMove));

        ctx.momentum.expected_premium = 3.9;
        let report = gate.run(&ctx);
        assert!(!report.passed(GateName::MomentumTiming));

        ctx.momentum.expected_premium = 12.0;
        assert!(gate.run(&ctx).passed(GateName::ExpectedMove));
    }

    #[test]
    fn test_strike_quality_fails_closed_on_missing_data() {
        let gate = PreTradeGate::default();

        let mut ctx = passing_context();
        ctx.strike.delta = None;
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));

        let mut ctx = passing_context();
        ctx.strike.spread_pct = None;
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));

        let mut ctx = passing_context();
        ctx.strike.atm_strike = 0.0;
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));
    }

    #[test]
    fn test_strike_quality_bounds() {
        let gate = PreTradeGate::default();
        let mut ctx = passing_context();

        ctx.strike.delta = Some(0.40);
        assert!(gate.run(&ctx).passed(GateName::StrikeQuality));
        ctx.strike.delta = Some(0.56);
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));

        let mut ctx = passing_context();
        ctx.strike.spread_pct = Some(1.0);
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));

        let mut ctx = passing_context();
        ctx.strike.strike_price = 22400.0;
        assert!(!gate.run(&ctx).passed(GateName::StrikeQuality));
    }

    #[test]
    fn test_risk_feasibility() {
        let gate = PreTradeGate::default();
        let mut ctx = passing_context();

        ctx.risk = RiskContext::new(dec!(1500), dec!(1000));
        assert!(gate.run(&ctx).passed(GateName::RiskFeasibility));

        ctx.risk = RiskContext::new(dec!(1501), dec!(1000));
        assert!(!gate.run(&ctx).passed(GateName::RiskFeasibility));

        ctx.risk = RiskContext::new(dec!(0), dec!(0));
        assert!(!gate.run(&ctx).passed(GateName::RiskFeasibility));
    }

    #[test]
    fn test_risk_feasibility_with_huge_expected_win() {
        let gate = PreTradeGate::default();
        let mut ctx = passing_context();

        ctx.risk = RiskContext::new(dec!(1200), Decimal::MAX);
        let report = gate.run(&ctx);
        assert!(report.passed(GateName::RiskFeasibility));
        assert!(report.allowed());
    }

    #[test]
    fn test_report_serializes_as_ordered_map() {
        let report = PreTradeGate::default().run(&passing_context());
        let json = serde_json::to_string(&report).unwrap();

        let positions: Vec<usize> = GateName::ALL
            .iter()
            .map(|n| json.find(&format!("\"{}\":", n.as_str())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strike_quality"]["passed"], true);
    }
}
