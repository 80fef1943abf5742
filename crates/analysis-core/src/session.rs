//! NSE session calendar helpers. All session logic runs in IST.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

use crate::Candle;

/// Exchange timezone
pub const EXCHANGE_TZ: Tz = Kolkata;

/// Cash/F&O session open, 09:15 IST
pub fn session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN)
}

pub fn to_ist(ts: DateTime<Utc>) -> DateTime<Tz> {
    ts.with_timezone(&EXCHANGE_TZ)
}

/// IST trading date of a timestamp
pub fn session_date(ts: DateTime<Utc>) -> NaiveDate {
    to_ist(ts).date_naive()
}

/// IST wall-clock time of a timestamp
pub fn local_time(ts: DateTime<Utc>) -> NaiveTime {
    to_ist(ts).time()
}

/// Whether the candle opened at or after 09:15 IST on `date`.
pub fn in_session(candle: &Candle, date: NaiveDate) -> bool {
    let ist = to_ist(candle.timestamp);
    ist.date_naive() == date && ist.time() >= session_open()
}

/// Index of the first candle belonging to the latest candle's session.
///
/// Returns 0 when every candle shares the latest date (or the slice is empty).
pub fn latest_session_start(candles: &[Candle]) -> usize {
    session_start(candles).unwrap_or(candles.len().saturating_sub(1))
}

/// Index of the first candle at or after 09:15 IST on the latest candle's
/// date, `None` when the latest date has no such candle yet.
pub fn session_start(candles: &[Candle]) -> Option<usize> {
    let date = session_date(candles.last()?.timestamp);
    candles.iter().position(|c| in_session(c, date))
}

/// Candles of the latest session only.
pub fn latest_session(candles: &[Candle]) -> &[Candle] {
    &candles[latest_session_start(candles)..]
}
