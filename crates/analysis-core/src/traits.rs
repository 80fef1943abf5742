use crate::Candle;

/// A total analyzer over a candle series.
///
/// Implementations never fail: a series shorter than `min_candles` yields the
/// analyzer's neutral output.
pub trait CandleAnalyzer: Send + Sync {
    type Output;

    fn name(&self) -> &'static str;

    /// Minimum number of candles before the analyzer produces a non-neutral output
    fn min_candles(&self) -> usize;

    fn analyze(&self, candles: &[Candle]) -> Self::Output;
}
