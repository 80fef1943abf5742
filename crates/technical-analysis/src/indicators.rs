use analysis_core::stats::mean;
use analysis_core::Candle;

/// True range of each candle after the first.
///
/// `result[i]` belongs to `candles[i + 1]`.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, curr) = (&w[0], &w[1]);
            let high_low = curr.high - curr.low;
            let high_close = (curr.high - prev.close).abs();
            let low_close = (curr.low - prev.close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range with Wilder smoothing.
///
/// `result[k]` is the ATR as of `candles[k + period]`; the series is empty
/// until `period + 1` candles are available.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return vec![];
    }

    let trs = true_ranges(candles);

    let mut atr_values = Vec::with_capacity(trs.len() - period + 1);
    let mut atr = trs[..period].iter().sum::<f64>() / period as f64;
    atr_values.push(atr);

    for tr in &trs[period..] {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
        atr_values.push(atr);
    }

    atr_values
}

/// Mean high-low range of the candles.
pub fn average_range(candles: &[Candle]) -> f64 {
    let ranges: Vec<f64> = candles.iter().map(Candle::range).collect();
    mean(&ranges)
}

/// Average body share of the last `window` candles.
///
/// Zero-range candles contribute 0 instead of dividing by zero.
pub fn trailing_body_percent(candles: &[Candle], window: usize) -> f64 {
    if window == 0 || candles.is_empty() {
        return 0.0;
    }
    let recent = &candles[candles.len().saturating_sub(window)..];
    let shares: Vec<f64> = recent.iter().map(Candle::body_percent).collect();
    mean(&shares)
}

/// Highest high and lowest low of a slice, `None` when empty.
pub fn high_low(candles: &[Candle]) -> Option<(f64, f64)> {
    if candles.is_empty() {
        return None;
    }
    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    Some((high, low))
}
