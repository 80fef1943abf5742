//! Options intraday trade decision pipeline.
//!
//! Analyzers -> pre-trade gates -> expansion score -> lot sizing against the
//! daily loss ledger -> BUY / NO_TRADE.

pub mod config;
pub mod decision;
pub mod engine;
pub mod request;

pub use config::EngineConfig;
pub use decision::{TradeAction, TradeDecision, TradeSetup};
pub use engine::TradeDecisionEngine;
pub use request::{EvaluationRequest, RiskRequest, StrikeRequest};
