use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Loss amount must be non-negative, got {0}")]
    NegativeLoss(Decimal),

    #[error("Daily loss cap must be non-negative, got {0}")]
    NegativeCap(Decimal),

    #[error("Result dated {date} belongs to a closed session (ledger is on {current})")]
    StaleSession { date: NaiveDate, current: NaiveDate },
}

/// Point-in-time view of the daily loss ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// IST trading date the ledger is tracking, if one has been opened
    pub session: Option<NaiveDate>,
    pub cap: Decimal,
    pub realized_loss: Decimal,
    pub remaining_capacity: Decimal,
    pub losses_recorded: u32,
    /// Winning trades seen; these never offset realized losses
    pub wins_ignored: u32,
    pub cap_reached: bool,
}
