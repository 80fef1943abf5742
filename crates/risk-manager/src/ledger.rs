use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::models::{LedgerError, LedgerSnapshot};

#[derive(Debug, Default)]
struct LedgerState {
    session: Option<NaiveDate>,
    realized_loss: Decimal,
    losses_recorded: u32,
    wins_ignored: u32,
}

/// Realized-loss ledger for one trading day.
///
/// Shared as `Arc<DailyLossTracker>`. Only losses accumulate; wins never
/// restore capacity. Every method takes the lock once, so a read of
/// `remaining_capacity` followed by a sizing decision must go through
/// [`DailyLossTracker::with_remaining_capacity`] to stay consistent.
#[derive(Debug)]
pub struct DailyLossTracker {
    cap: Decimal,
    state: Mutex<LedgerState>,
}

impl DailyLossTracker {
    pub fn new(cap: Decimal) -> Result<Self, LedgerError> {
        if cap < Decimal::ZERO {
            return Err(LedgerError::NegativeCap(cap));
        }
        Ok(Self {
            cap,
            state: Mutex::new(LedgerState::default()),
        })
    }

    // Poisoning is recovered; the state has no multi-step updates.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self, state: &LedgerState) -> Decimal {
        (self.cap - state.realized_loss).max(Decimal::ZERO)
    }

    fn book_loss(&self, state: &mut LedgerState, amount: Decimal) {
        state.realized_loss = state.realized_loss.saturating_add(amount);
        state.losses_recorded += 1;
        let remaining = self.remaining(state);

        info!(
            loss = %amount,
            realized_loss = %state.realized_loss,
            remaining = %remaining,
            session = ?state.session,
            "Recorded realized loss"
        );
        if remaining.is_zero() {
            warn!(cap = %self.cap, "Daily loss cap reached");
        }
    }

    fn book_result(&self, state: &mut LedgerState, pnl: Decimal) {
        if pnl < Decimal::ZERO {
            self.book_loss(state, -pnl);
        } else {
            state.wins_ignored += 1;
        }
    }

    /// Move `state` to `date` if it is later than the tracked session.
    fn roll_forward(&self, state: &mut LedgerState, date: NaiveDate) -> bool {
        if state.session.is_some_and(|current| date <= current) {
            return false;
        }

        let previous = state.session;
        *state = LedgerState {
            session: Some(date),
            ..LedgerState::default()
        };
        info!(?previous, session = %date, "Daily loss ledger rolled to new session");
        true
    }

    /// Lock the ledger on `date`'s session, rolling forward if needed.
    /// Results for an already closed session are refused.
    fn lock_session(&self, date: NaiveDate) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        let mut state = self.lock();
        if let Some(current) = state.session.filter(|current| date < *current) {
            return Err(LedgerError::StaleSession { date, current });
        }
        self.roll_forward(&mut state, date);
        Ok(state)
    }

    /// Book a realized loss, given as a positive amount, against the
    /// current session.
    pub fn record_loss(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeLoss(amount));
        }
        let mut state = self.lock();
        self.book_loss(&mut state, amount);
        Ok(())
    }

    /// Book a loss realized on the IST trading date `date`. A later date
    /// rolls the ledger over first, under the same lock.
    pub fn record_loss_on(&self, date: NaiveDate, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeLoss(amount));
        }
        let mut state = self.lock_session(date)?;
        self.book_loss(&mut state, amount);
        Ok(())
    }

    /// Book a closed trade's P&L. Losses are recorded, wins only counted.
    pub fn record_trade_result(&self, pnl: Decimal) {
        let mut state = self.lock();
        self.book_result(&mut state, pnl);
    }

    /// Dated form of [`DailyLossTracker::record_trade_result`].
    pub fn record_trade_result_on(&self, date: NaiveDate, pnl: Decimal) -> Result<(), LedgerError> {
        let mut state = self.lock_session(date)?;
        self.book_result(&mut state, pnl);
        Ok(())
    }

    pub fn remaining_capacity(&self) -> Decimal {
        let state = self.lock();
        self.remaining(&state)
    }

    pub fn realized_loss(&self) -> Decimal {
        self.lock().realized_loss
    }

    /// Zero the ledger for a new session. The tracked date is kept.
    pub fn reset(&self) {
        let mut state = self.lock();
        let session = state.session;
        *state = LedgerState {
            session,
            ..LedgerState::default()
        };
        info!(cap = %self.cap, "Daily loss ledger reset");
    }

    /// Roll the ledger forward to `date`, resetting it. Dates at or before
    /// the tracked session leave the ledger untouched. Returns whether it
    /// rolled.
    pub fn begin_session(&self, date: NaiveDate) -> bool {
        let mut state = self.lock();
        self.roll_forward(&mut state, date)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        let remaining = self.remaining(&state);
        LedgerSnapshot {
            session: state.session,
            cap: self.cap,
            realized_loss: state.realized_loss,
            remaining_capacity: remaining,
            losses_recorded: state.losses_recorded,
            wins_ignored: state.wins_ignored,
            cap_reached: remaining.is_zero(),
        }
    }

    /// Run `f` against the remaining capacity while holding the ledger lock.
    ///
    /// No loss can be recorded until `f` returns, so `f` must not call back
    /// into the tracker.
    pub fn with_remaining_capacity<R>(&self, f: impl FnOnce(Decimal) -> R) -> R {
        let state = self.lock();
        f(self.remaining(&state))
    }
}
