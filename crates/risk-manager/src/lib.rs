pub mod ledger;
pub mod models;

pub use ledger::DailyLossTracker;
pub use models::*;
