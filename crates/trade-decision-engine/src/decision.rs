use analysis_core::TradeSide;
use expansion_scorer::ScoreBreakdown;
use serde::Serialize;
use trade_gates::{GateContext, GateReport};

use crate::request::StrikeRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    NoTrade,
}

/// Order fields the caller already chose for the candidate contract
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSetup {
    pub security_id: String,
    pub side: TradeSide,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub target_price: f64,
}

impl From<&StrikeRequest> for TradeSetup {
    fn from(strike: &StrikeRequest) -> Self {
        Self {
            security_id: strike.security_id.clone(),
            side: strike.side,
            entry_price: strike.entry_price,
            stop_loss_price: strike.stop_loss_price,
            target_price: strike.target_price,
        }
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct TradeDecision {
    pub action: TradeAction,
    pub side: TradeSide,
    pub security_id: String,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub target_price: f64,
    /// lots x lot_size
    pub quantity: u32,
    pub lot_size: u32,
    pub lots: u32,
    /// Score total; 0 when the gates rejected before scoring
    pub expansion_score: u32,
    pub expected_premium: f64,
    pub expected_index_move: f64,
    pub gate_results: GateReport,
    pub failed_gates: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TradeDecision {
    /// Starts as NO_TRADE with zero lots; the engine upgrades it once sizing
    /// succeeds.
    pub(crate) fn new(setup: &TradeSetup, ctx: &GateContext, report: GateReport, lot_size: u32) -> Self {
        Self {
            action: TradeAction::NoTrade,
            side: setup.side,
            security_id: setup.security_id.clone(),
            entry_price: setup.entry_price,
            stop_loss_price: setup.stop_loss_price,
            target_price: setup.target_price,
            quantity: 0,
            lot_size,
            lots: 0,
            expansion_score: 0,
            expected_premium: ctx.momentum.expected_premium,
            expected_index_move: ctx.momentum.expected_index_move,
            failed_gates: report.failed_gates(),
            gate_results: report,
            score_breakdown: None,
            blocked_reason: None,
            reason: None,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.action == TradeAction::Buy
    }
}
