use std::sync::Arc;

use analysis_core::session::{local_time, session_date};
use analysis_core::{CandleAnalyzer, Timeframe, ValidationError};
use anyhow::Result;
use chrono::{DateTime, Utc};
use expansion_scorer::ExpansionScorer;
use lot_sizer::LotSizer;
use market_regime_detector::DayTypeClassifier;
use risk_manager::{DailyLossTracker, LedgerError};
use rust_decimal::Decimal;
use technical_analysis::{MomentumAnalyzer, StructureAnalyzer, VolatilityAnalyzer};
use tracing::{debug, info, warn};
use trade_gates::{GateContext, GateThresholds, PreTradeGate};

use crate::config::EngineConfig;
use crate::decision::{TradeAction, TradeDecision, TradeSetup};
use crate::request::EvaluationRequest;

/// Runs analyzers, gates, scoring and sizing for one candidate trade.
///
/// Every stage is a pure function of the request except sizing, which reads
/// the shared daily loss ledger under its lock.
pub struct TradeDecisionEngine {
    config: EngineConfig,
    classifier: DayTypeClassifier,
    structure: StructureAnalyzer,
    volatility: VolatilityAnalyzer,
    momentum: MomentumAnalyzer,
    gate: PreTradeGate,
    scorer: ExpansionScorer,
    sizer: LotSizer,
    ledger: Arc<DailyLossTracker>,
}

impl TradeDecisionEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let ledger = Arc::new(DailyLossTracker::new(config.daily_loss_cap)?);
        Self::with_ledger(config, ledger)
    }

    /// Build around an existing ledger so several engines share one budget.
    pub fn with_ledger(config: EngineConfig, ledger: Arc<DailyLossTracker>) -> Result<Self> {
        config.validate()?;
        let sizer = config.lot_sizer()?;
        Ok(Self {
            gate: PreTradeGate::new(GateThresholds::with_windows(config.windows.clone())),
            scorer: ExpansionScorer::new(config.windows.clone()),
            classifier: DayTypeClassifier::new(),
            structure: StructureAnalyzer::new(),
            volatility: VolatilityAnalyzer::new(),
            momentum: MomentumAnalyzer::new(),
            sizer,
            ledger,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<DailyLossTracker> {
        &self.ledger
    }

    /// Book a closed trade's P&L against the IST session it closed in.
    pub fn record_trade_result(&self, closed_at: DateTime<Utc>, pnl: Decimal) -> Result<(), LedgerError> {
        self.ledger.record_trade_result_on(session_date(closed_at), pnl)
    }

    /// Parse, validate and evaluate a JSON request.
    pub fn evaluate_json(&self, raw: &str) -> Result<TradeDecision, ValidationError> {
        let request = EvaluationRequest::from_json(raw)?;
        self.evaluate(&request)
    }

    /// Full pipeline for a request. Nothing runs if validation fails.
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<TradeDecision, ValidationError> {
        request.validate()?;

        let candles_5m = request.candles_until_now(Timeframe::Minute5);
        let candles_15m = request.candles_until_now(Timeframe::Minute15);

        self.ledger.begin_session(session_date(request.timestamp));

        let ctx = GateContext {
            day_type: self.classifier.analyze(candles_15m),
            structure: self.structure.analyze(candles_5m),
            volatility: self.volatility.analyze(candles_5m),
            momentum: self
                .momentum
                .analyze(candles_5m, request.strike.delta.unwrap_or(0.0)),
            local_time: local_time(request.timestamp),
            strike: request.strike.strike_context(),
            risk: request.risk.risk_context(),
        };
        debug!(
            day_type = ctx.day_type.label(),
            structure = ctx.structure.kind.as_str(),
            expanding = ctx.volatility.expanding,
            expected_premium = ctx.momentum.expected_premium,
            "analyzers complete"
        );

        Ok(self.recommend(&ctx, &TradeSetup::from(&request.strike)))
    }

    /// Gate, score and size an already-assembled context.
    pub fn recommend(&self, ctx: &GateContext, setup: &TradeSetup) -> TradeDecision {
        let lot_size = self.config.lot_multiplier;
        let report = self.gate.run(ctx);

        if !report.allowed() {
            let failed = report.failed_gates();
            info!(
                security_id = %setup.security_id,
                gates = %report.summary(),
                "NO_TRADE: pre-trade gates failed"
            );
            let reason = format!("Pre-trade gates failed: {}", failed.join(", "));
            let mut decision = TradeDecision::new(setup, ctx, report, lot_size);
            decision.reason = Some(reason);
            return decision;
        }

        let score = self.scorer.score(ctx);
        let total = score.total;
        if total < self.config.min_score {
            info!(
                security_id = %setup.security_id,
                score = total,
                min_score = self.config.min_score,
                "NO_TRADE: expansion score too low"
            );
            let reason = format!(
                "Expansion score too low: {}/100 (minimum: {})",
                total, self.config.min_score
            );
            let mut decision = TradeDecision::new(setup, ctx, report, lot_size);
            decision.expansion_score = total;
            decision.score_breakdown = Some(score);
            decision.reason = Some(reason);
            return decision;
        }

        let (sizing, remaining) = self.ledger.with_remaining_capacity(|remaining| {
            (
                self.sizer.size_for(total, remaining, ctx.risk.max_loss),
                remaining,
            )
        });

        if sizing.is_blocked() {
            let blocked = sizing.blocked_reason.clone().unwrap_or_default();
            warn!(
                security_id = %setup.security_id,
                score = total,
                remaining = %remaining,
                max_loss_per_lot = %ctx.risk.max_loss,
                blocked_reason = %blocked,
                "NO_TRADE: sizing blocked"
            );
            let reason = format!(
                "Sizing blocked ({}): remaining capacity {} for max loss {} per lot",
                blocked, remaining, ctx.risk.max_loss
            );
            let mut decision = TradeDecision::new(setup, ctx, report, lot_size);
            decision.expansion_score = total;
            decision.score_breakdown = Some(score);
            decision.blocked_reason = sizing.blocked_reason;
            decision.reason = Some(reason);
            return decision;
        }

        let lots = sizing.lots;
        info!(
            security_id = %setup.security_id,
            side = %setup.side,
            score = total,
            lots,
            base_lots = sizing.base_lots,
            remaining = %remaining,
            "BUY"
        );

        let mut decision = TradeDecision::new(setup, ctx, report, lot_size);
        decision.action = TradeAction::Buy;
        decision.lots = lots;
        decision.quantity = lots * lot_size;
        decision.expansion_score = total;
        decision.score_breakdown = Some(score);
        decision
    }
}
