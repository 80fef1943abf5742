use anyhow::{bail, Result};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const BLOCKED_SCORE: &str = "score_below_minimum";
pub const BLOCKED_DAILY_LOSS_CAP: &str = "daily_loss_cap";

/// One score band: scores at or above `min_score` earn `lots`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotBand {
    pub min_score: u32,
    pub lots: u32,
}

/// Score-banded lot sizing
///
/// The score picks a base lot count from a step table, which is then clipped
/// down until the worst-case loss of the position fits in the remaining daily
/// risk budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSizer {
    /// Ascending by `min_score`; scores below the first band get zero lots
    bands: Vec<LotBand>,
}

/// Sizing outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingDecision {
    pub score: u32,

    /// Lots from the score band before the risk budget clip
    pub base_lots: u32,

    /// Final lot count
    pub lots: u32,

    /// Why `lots` is zero, if it is
    pub blocked_reason: Option<String>,
}

impl SizingDecision {
    pub fn is_blocked(&self) -> bool {
        self.lots == 0
    }
}

impl Default for LotSizer {
    fn default() -> Self {
        Self {
            bands: vec![
                LotBand { min_score: 50, lots: 1 },
                LotBand { min_score: 65, lots: 2 },
                LotBand { min_score: 75, lots: 3 },
                LotBand { min_score: 85, lots: 4 },
            ],
        }
    }
}

impl LotSizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom band table. Bands must be strictly ascending in both score and
    /// lots, with at least one entry.
    pub fn with_bands(bands: Vec<LotBand>) -> Result<Self> {
        if bands.is_empty() {
            bail!("at least one lot band is required");
        }
        if bands.iter().any(|b| b.lots == 0) {
            bail!("lot bands must award at least one lot");
        }
        if bands.iter().any(|b| b.min_score > 100) {
            bail!("lot band scores must be within 0-100");
        }
        for pair in bands.windows(2) {
            if pair[1].min_score <= pair[0].min_score || pair[1].lots <= pair[0].lots {
                bail!(
                    "lot bands must be strictly ascending (band at {} follows {})",
                    pair[1].min_score,
                    pair[0].min_score
                );
            }
        }
        Ok(Self { bands })
    }

    /// Default band table with the first band moved to `min_score`.
    ///
    /// `min_score` must stay below the second band (65).
    pub fn with_min_score(min_score: u32) -> Result<Self> {
        let mut bands = Self::default().bands;
        bands[0].min_score = min_score;
        Self::with_bands(bands)
    }

    /// Lowest score that earns any lots
    pub fn min_score(&self) -> u32 {
        self.bands.first().map(|b| b.min_score).unwrap_or(u32::MAX)
    }

    /// Lots for a score before any risk clip
    pub fn base_lots(&self, score: u32) -> u32 {
        self.bands
            .iter()
            .rev()
            .find(|b| score >= b.min_score)
            .map(|b| b.lots)
            .unwrap_or(0)
    }

    /// Size a position.
    ///
    /// `remaining_capacity` is the unspent daily loss budget; `max_loss_per_lot`
    /// the worst-case loss of one lot. A non-positive `max_loss_per_lot` skips
    /// the clip.
    pub fn size_for(
        &self,
        score: u32,
        remaining_capacity: Decimal,
        max_loss_per_lot: Decimal,
    ) -> SizingDecision {
        let base_lots = self.base_lots(score);
        if base_lots == 0 {
            return SizingDecision {
                score,
                base_lots,
                lots: 0,
                blocked_reason: Some(BLOCKED_SCORE.to_string()),
            };
        }

        let lots = if max_loss_per_lot > Decimal::ZERO {
            // Overflow means the budget covers any lot count
            let affordable = remaining_capacity
                .max(Decimal::ZERO)
                .checked_div(max_loss_per_lot)
                .and_then(|n| n.floor().to_u32())
                .unwrap_or(u32::MAX);
            base_lots.min(affordable)
        } else {
            base_lots
        };

        let blocked_reason = if lots == 0 {
            Some(BLOCKED_DAILY_LOSS_CAP.to_string())
        } else {
            None
        };

        debug!(
            "Sized score {}: base {} lots, final {} (remaining {}, per lot {})",
            score, base_lots, lots, remaining_capacity, max_loss_per_lot
        );

        SizingDecision {
            score,
            base_lots,
            lots,
            blocked_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_band_edges() {
        let sizer = LotSizer::default();
        for (score, lots) in [
            (0, 0),
            (49, 0),
            (50, 1),
            (64, 1),
            (65, 2),
            (74, 2),
            (75, 3),
            (84, 3),
            (85, 4),
            (100, 4),
        ] {
            assert_eq!(sizer.base_lots(score), lots, "score {}", score);
        }
    }

    #[test]
    fn test_lots_non_decreasing_in_score() {
        let sizer = LotSizer::default();
        let lots: Vec<u32> = (0..=100).map(|s| sizer.size_for(s, dec!(1000000), dec!(1000)).lots).collect();
        assert!(lots.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_below_minimum_score() {
        let decision = LotSizer::default().size_for(42, dec!(10000), dec!(1200));
        assert_eq!(decision.lots, 0);
        assert_eq!(decision.blocked_reason.as_deref(), Some(BLOCKED_SCORE));
    }

    #[test]
    fn test_clipped_by_remaining_capacity() {
        // 10000 cap with 6000 already lost
        let decision = LotSizer::default().size_for(90, dec!(4000), dec!(1200));
        assert_eq!(decision.base_lots, 4);
        assert_eq!(decision.lots, 3);
        assert!(decision.blocked_reason.is_none());
    }

    #[test]
    fn test_blocked_by_daily_loss_cap() {
        let decision = LotSizer::default().size_for(90, dec!(1000), dec!(1200));
        assert_eq!(decision.lots, 0);
        assert!(decision.is_blocked());
        assert_eq!(decision.blocked_reason.as_deref(), Some(BLOCKED_DAILY_LOSS_CAP));

        let exhausted = LotSizer::default().size_for(90, dec!(0), dec!(1200));
        assert_eq!(exhausted.blocked_reason.as_deref(), Some(BLOCKED_DAILY_LOSS_CAP));
    }

    #[test]
    fn test_sized_loss_never_exceeds_capacity() {
        let sizer = LotSizer::default();
        for remaining in [dec!(0), dec!(1199), dec!(1200), dec!(2500), dec!(3600), dec!(100000)] {
            for score in [50, 70, 80, 95] {
                let decision = sizer.size_for(score, remaining, dec!(1200));
                assert!(Decimal::from(decision.lots) * dec!(1200) <= remaining);
                assert!(decision.lots <= decision.base_lots);
            }
        }
    }

    #[test]
    fn test_zero_loss_per_lot_is_not_clipped() {
        let decision = LotSizer::default().size_for(85, dec!(0), dec!(0));
        assert_eq!(decision.lots, 4);
    }

    #[test]
    fn test_tiny_loss_per_lot_does_not_overflow() {
        let decision = LotSizer::default().size_for(90, dec!(10000), dec!(0.0000000000000000000000001));
        assert_eq!(decision.lots, 4);
        assert!(decision.blocked_reason.is_none());

        let exhausted = LotSizer::default().size_for(90, dec!(0), dec!(0.0000000000000000000000001));
        assert_eq!(exhausted.blocked_reason.as_deref(), Some(BLOCKED_DAILY_LOSS_CAP));
    }

    #[test]
    fn test_min_score_moves_first_band() {
        let sizer = LotSizer::with_min_score(40).unwrap();
        assert_eq!(sizer.min_score(), 40);
        assert_eq!(sizer.base_lots(42), 1);
        assert_eq!(sizer.base_lots(39), 0);
        assert_eq!(sizer.base_lots(85), 4);

        assert_eq!(LotSizer::with_min_score(50).unwrap().base_lots(49), 0);
        assert!(LotSizer::with_min_score(65).is_err());
        assert!(LotSizer::with_min_score(80).is_err());
    }

    #[test]
    fn test_custom_bands_validated() {
        assert!(LotSizer::with_bands(vec![]).is_err());
        assert!(LotSizer::with_bands(vec![
            LotBand { min_score: 60, lots: 1 },
            LotBand { min_score: 55, lots: 2 },
        ])
        .is_err());
        assert!(LotSizer::with_bands(vec![LotBand { min_score: 40, lots: 0 }]).is_err());

        let sizer = LotSizer::with_bands(vec![
            LotBand { min_score: 60, lots: 1 },
            LotBand { min_score: 80, lots: 2 },
        ])
        .unwrap();
        assert_eq!(sizer.min_score(), 60);
        assert_eq!(sizer.base_lots(59), 0);
        assert_eq!(sizer.base_lots(99), 2);
    }
}
