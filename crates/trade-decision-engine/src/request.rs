use analysis_core::{Candle, Timeframe, TradeSide, ValidationError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trade_gates::{RiskContext, StrikeContext};

/// Candidate option contract plus its order prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeRequest {
    pub security_id: String,
    pub side: TradeSide,
    pub strike_price: f64,
    pub atm_strike: f64,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub spread_pct: Option<f64>,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub target_price: f64,
}

impl StrikeRequest {
    pub fn strike_context(&self) -> StrikeContext {
        StrikeContext {
            strike_price: self.strike_price,
            atm_strike: self.atm_strike,
            delta: self.delta,
            spread_pct: self.spread_pct,
        }
    }
}

/// Per-lot risk estimate supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    pub max_loss_per_lot: Decimal,
    pub expected_win_per_lot: Decimal,
}

impl RiskRequest {
    pub fn risk_context(&self) -> RiskContext {
        RiskContext::new(self.max_loss_per_lot, self.expected_win_per_lot)
    }
}

/// One evaluation request at the pipeline boundary.
///
/// Deserializing only checks shape; call [`EvaluationRequest::validate`]
/// before handing the request to any analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Evaluation instant, any RFC 3339 offset
    pub timestamp: DateTime<Utc>,
    pub candles_5m: Vec<Candle>,
    pub candles_15m: Vec<Candle>,
    pub strike: StrikeRequest,
    pub risk: RiskRequest,
}

impl EvaluationRequest {
    /// Parse and validate a JSON request.
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        let request: Self = serde_json::from_str(raw)?;
        request.validate()?;
        Ok(request)
    }

    pub fn candles(&self, timeframe: Timeframe) -> &[Candle] {
        match timeframe {
            Timeframe::Minute5 => &self.candles_5m,
            Timeframe::Minute15 => &self.candles_15m,
        }
    }

    /// Candles of `timeframe` that opened at or before the evaluation instant
    pub fn candles_until_now(&self, timeframe: Timeframe) -> &[Candle] {
        let candles = self.candles(timeframe);
        let end = candles.partition_point(|c| c.timestamp <= self.timestamp);
        &candles[..end]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_series("candles_5m", self.candles(Timeframe::Minute5))?;
        validate_series("candles_15m", self.candles(Timeframe::Minute15))?;

        let strike = &self.strike;
        if strike.security_id.trim().is_empty() {
            return Err(ValidationError::MissingField("strike.security_id"));
        }
        positive("strike.strike_price", strike.strike_price)?;
        finite("strike.atm_strike", strike.atm_strike)?;
        positive("strike.entry_price", strike.entry_price)?;
        positive("strike.stop_loss_price", strike.stop_loss_price)?;
        positive("strike.target_price", strike.target_price)?;
        if let Some(delta) = strike.delta {
            finite("strike.delta", delta)?;
        }
        if let Some(spread) = strike.spread_pct {
            finite("strike.spread_pct", spread)?;
            if spread < 0.0 {
                return Err(invalid("strike.spread_pct", format!("must be non-negative, got {}", spread)));
            }
        }

        if self.risk.max_loss_per_lot < Decimal::ZERO {
            return Err(invalid(
                "risk.max_loss_per_lot",
                format!("must be non-negative, got {}", self.risk.max_loss_per_lot),
            ));
        }
        if self.risk.expected_win_per_lot < Decimal::ZERO {
            return Err(invalid(
                "risk.expected_win_per_lot",
                format!("must be non-negative, got {}", self.risk.expected_win_per_lot),
            ));
        }

        Ok(())
    }
}

fn validate_series(series: &'static str, candles: &[Candle]) -> Result<(), ValidationError> {
    for (index, candle) in candles.iter().enumerate() {
        let bad = |reason: String| ValidationError::InvalidCandle { series, index, reason };

        let prices = [candle.open, candle.high, candle.low, candle.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(bad("non-finite price".to_string()));
        }
        if prices.iter().any(|p| *p <= 0.0) {
            return Err(bad("non-positive price".to_string()));
        }
        if candle.high < candle.low {
            return Err(bad(format!("high {} below low {}", candle.high, candle.low)));
        }
        if candle.open > candle.high
            || candle.open < candle.low
            || candle.close > candle.high
            || candle.close < candle.low
        {
            return Err(bad("open/close outside the high-low range".to_string()));
        }
        if !candle.volume.is_finite() || candle.volume < 0.0 {
            return Err(bad(format!("invalid volume {}", candle.volume)));
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(bad("timestamps must be strictly ascending".to_string()));
        }
    }
    Ok(())
}

fn invalid(field: &'static str, reason: String) -> ValidationError {
    ValidationError::InvalidValue { field, reason }
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {}", value)))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {}", value)))
    }
}
