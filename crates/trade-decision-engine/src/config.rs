use anyhow::{bail, Context, Result};
use lot_sizer::LotSizer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use trade_gates::TimeWindow;

/// Upper bound on shares per lot; keeps `lots x lot_multiplier` within u32
pub const MAX_LOT_MULTIPLIER: u32 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Risk budget
    pub daily_loss_cap: Decimal, // 10000

    // Exchange lot size, shares per lot
    pub lot_multiplier: u32, // 50

    // Admissible IST entry windows
    pub windows: Vec<TimeWindow>, // 10:30-13:00, 13:45-14:30

    // Minimum expansion score to trade; also the first lot band
    pub min_score: u32, // 50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_loss_cap: Decimal::new(10_000, 0),
            lot_multiplier: 50,
            windows: TimeWindow::defaults(),
            min_score: 50,
        }
    }
}

impl EngineConfig {
    /// Load from the process environment after reading `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Unset keys fall back to the
    /// defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let windows = match lookup("TRADE_WINDOWS") {
            Some(raw) => TimeWindow::parse_list(&raw).context("TRADE_WINDOWS is invalid")?,
            None => defaults.windows,
        };

        let config = Self {
            daily_loss_cap: parse_or(&lookup, "DAILY_LOSS_CAP", defaults.daily_loss_cap)?,
            lot_multiplier: parse_or(&lookup, "LOT_MULTIPLIER", defaults.lot_multiplier)?,
            windows,
            min_score: parse_or(&lookup, "MIN_EXPANSION_SCORE", defaults.min_score)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.daily_loss_cap < Decimal::ZERO {
            bail!("DAILY_LOSS_CAP must be non-negative, got {}", self.daily_loss_cap);
        }
        if self.lot_multiplier == 0 || self.lot_multiplier > MAX_LOT_MULTIPLIER {
            bail!(
                "LOT_MULTIPLIER must be within 1-{}, got {}",
                MAX_LOT_MULTIPLIER,
                self.lot_multiplier
            );
        }
        if self.windows.is_empty() {
            bail!("TRADE_WINDOWS must contain at least one window");
        }
        if self.min_score > 100 {
            bail!("MIN_EXPANSION_SCORE must be within 0-100, got {}", self.min_score);
        }
        self.lot_sizer()?;
        Ok(())
    }

    /// Lot sizer whose first band starts at `min_score`
    pub fn lot_sizer(&self) -> Result<LotSizer> {
        LotSizer::with_min_score(self.min_score).with_context(|| {
            format!(
                "MIN_EXPANSION_SCORE {} must sit below the two-lot band",
                self.min_score
            )
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.daily_loss_cap, dec!(10000));
        assert_eq!(config.lot_multiplier, 50);
        assert_eq!(config.min_score, 50);
        assert_eq!(config.windows, TimeWindow::defaults());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("DAILY_LOSS_CAP", "7500.50"),
            ("LOT_MULTIPLIER", "25"),
            ("TRADE_WINDOWS", "10:00-11:00"),
            ("MIN_EXPANSION_SCORE", "60"),
        ]))
        .unwrap();
        assert_eq!(config.daily_loss_cap, dec!(7500.50));
        assert_eq!(config.lot_multiplier, 25);
        assert_eq!(config.windows.len(), 1);
        assert_eq!(config.windows[0].to_string(), "10:00-11:00");
        assert_eq!(config.min_score, 60);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let err = EngineConfig::from_lookup(lookup(&[("LOT_MULTIPLIER", "fifty")])).unwrap_err();
        assert!(err.to_string().contains("LOT_MULTIPLIER"));

        assert!(EngineConfig::from_lookup(lookup(&[("TRADE_WINDOWS", "13:00-10:00")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("LOT_MULTIPLIER", "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("DAILY_LOSS_CAP", "-5")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("MIN_EXPANSION_SCORE", "101")])).is_err());
    }

    #[test]
    fn test_lot_multiplier_bounded() {
        assert!(EngineConfig::from_lookup(lookup(&[("LOT_MULTIPLIER", "1000000")])).is_ok());
        let err = EngineConfig::from_lookup(lookup(&[("LOT_MULTIPLIER", "1073741824")])).unwrap_err();
        assert!(err.to_string().contains("LOT_MULTIPLIER"));
    }

    #[test]
    fn test_min_score_drives_first_lot_band() {
        let config = EngineConfig::from_lookup(lookup(&[("MIN_EXPANSION_SCORE", "40")])).unwrap();
        assert_eq!(config.lot_sizer().unwrap().base_lots(42), 1);

        // would swallow the two-lot band
        assert!(EngineConfig::from_lookup(lookup(&[("MIN_EXPANSION_SCORE", "70")])).is_err());
    }
}
