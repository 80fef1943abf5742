use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Body as a fraction of range. A zero-range candle has no body share.
    pub fn body_percent(&self) -> f64 {
        let range = self.range();
        if range <= 0.0 {
            return 0.0;
        }
        (self.body() / range).min(1.0)
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Direction of the candle body
    pub fn direction(&self) -> Direction {
        if self.is_bullish() {
            Direction::Bullish
        } else if self.is_bearish() {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }
}

/// Price direction of a signal or candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Direction {
    /// +1.0 for bullish, -1.0 for bearish, 0.0 otherwise
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
            Direction::Neutral => 0.0,
        }
    }
}

/// Option leg being bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    /// Call
    #[serde(rename = "CE", alias = "CALL")]
    Call,
    /// Put
    #[serde(rename = "PE", alias = "PUT")]
    Put,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Call => "CE",
            TradeSide::Put => "PE",
        }
    }

    /// Underlying direction that profits this leg
    pub fn direction(&self) -> Direction {
        match self {
            TradeSide::Call => Direction::Bullish,
            TradeSide::Put => Direction::Bearish,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candle interval used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Minute5,
    Minute15,
}
