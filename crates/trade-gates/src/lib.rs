//! Pre-trade admission gates.
//!
//! Eight independent checks over the analyzer outputs and the strike/risk
//! context. Every gate is always evaluated so the report is complete even
//! when the trade is rejected.

pub mod context;
pub mod gate;
pub mod report;
pub mod window;

pub use context::{GateContext, RiskContext, StrikeContext};
pub use gate::{GateThresholds, PreTradeGate};
pub use report::{GateName, GateReport, GateResult};
pub use window::{TimeWindow, WindowParseError};
