//! Rarity tiers
//!
//! Ordered rarity enum plus the per-tier tuning table and the weighted roll
//! used by loot and crafting.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Item rarity tiers, ordered from most to least common
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Get rarity name
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    /// Get numeric value for sorting (higher = rarer)
    pub fn sort_value(&self) -> u8 {
        *self as u8
    }

    /// Rarity for a tier index, saturating at Legendary
    pub fn from_index(index: usize) -> Rarity {
        Rarity::ALL[index.min(Rarity::ALL.len() - 1)]
    }

    /// Next tier up (Legendary stays Legendary)
    pub fn step_up(self) -> Rarity {
        Rarity::from_index(self as usize + 1)
    }

    /// Whether bonus luck scales this tier's weight
    pub fn is_luck_scaled(self) -> bool {
        self >= Rarity::Rare
    }
}

/// Tuning values for one rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityTier {
    /// Multiplier applied to the item's base stats while equipped
    pub stat_multiplier: f32,
    /// Multiplier applied to the base sell value
    pub sell_multiplier: u32,
    /// Relative weight in the rarity roll
    pub drop_weight: f32,
}

impl RarityTier {
    pub const fn new(stat_multiplier: f32, sell_multiplier: u32, drop_weight: f32) -> Self {
        Self { stat_multiplier, sell_multiplier, drop_weight }
    }
}

/// Rarity configuration, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityTable {
    /// Documented sum of all drop weights; loading fails when they disagree
    pub weight_total: f32,
    pub common: RarityTier,
    pub uncommon: RarityTier,
    pub rare: RarityTier,
    pub epic: RarityTier,
    pub legendary: RarityTier,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            weight_total: 100.0,
            common: RarityTier::new(1.0, 1, 50.0),
            uncommon: RarityTier::new(1.2, 2, 30.0),
            rare: RarityTier::new(1.5, 4, 15.0),
            epic: RarityTier::new(2.0, 8, 4.0),
            legendary: RarityTier::new(3.0, 20, 1.0),
        }
    }
}

/// Luck values beyond this are treated as this; keeps the weight sum finite
const MAX_LUCK_PERCENT: f64 = 1_000_000.0;

/// Tolerance when comparing the weight sum against the documented total
const WEIGHT_EPSILON: f32 = 1e-3;

impl RarityTable {
    /// Tuning for a tier
    pub fn tier(&self, rarity: Rarity) -> &RarityTier {
        match rarity {
            Rarity::Common => &self.common,
            Rarity::Uncommon => &self.uncommon,
            Rarity::Rare => &self.rare,
            Rarity::Epic => &self.epic,
            Rarity::Legendary => &self.legendary,
        }
    }

    pub fn stat_multiplier(&self, rarity: Rarity) -> f32 {
        self.tier(rarity).stat_multiplier
    }

    pub fn sell_multiplier(&self, rarity: Rarity) -> u32 {
        self.tier(rarity).sell_multiplier
    }

    /// Effective weights after applying bonus luck to Rare and above
    pub fn weights(&self, bonus_luck_percent: f32) -> [f64; 5] {
        let luck = if bonus_luck_percent.is_nan() {
            0.0
        } else {
            (bonus_luck_percent as f64).clamp(-MAX_LUCK_PERCENT, MAX_LUCK_PERCENT)
        };
        let luck_factor = (1.0 + luck / 100.0).max(0.0);

        let mut weights = [0.0; 5];
        for (weight, rarity) in weights.iter_mut().zip(Rarity::ALL) {
            let base = self.tier(rarity).drop_weight.max(0.0) as f64;
            *weight = if rarity.is_luck_scaled() { base * luck_factor } else { base };
        }
        weights
    }

    /// Probability of rolling exactly `rarity` at the given luck
    pub fn probability(&self, rarity: Rarity, bonus_luck_percent: f32) -> f64 {
        let weights = self.weights(bonus_luck_percent);
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return if rarity == Rarity::Common { 1.0 } else { 0.0 };
        }
        weights[rarity as usize] / total
    }

    /// Probability of rolling `rarity` or better at the given luck
    pub fn probability_at_least(&self, rarity: Rarity, bonus_luck_percent: f32) -> f64 {
        Rarity::ALL
            .iter()
            .filter(|r| **r >= rarity)
            .map(|r| self.probability(*r, bonus_luck_percent))
            .sum()
    }

    /// Weighted rarity roll
    ///
    /// Draws uniformly in `[0, total)` and returns the tier whose cumulative
    /// interval contains the draw. A zero total yields Common.
    pub fn roll(&self, bonus_luck_percent: f32, rng: &mut impl Rng) -> Rarity {
        let weights = self.weights(bonus_luck_percent);
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            return Rarity::Common;
        }

        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (rarity, weight) in Rarity::ALL.iter().zip(weights) {
            cumulative += weight;
            if draw < cumulative {
                return *rarity;
            }
        }

        // Float rounding can leave the draw just past the last boundary
        Rarity::ALL
            .iter()
            .zip(weights)
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(r, _)| *r)
            .unwrap_or(Rarity::Common)
    }

    /// Check weights and multipliers
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut sum = 0.0f32;
        for rarity in Rarity::ALL {
            let tier = self.tier(rarity);
            if !tier.drop_weight.is_finite() || tier.drop_weight < 0.0 {
                return Err(ConfigError::Rarity(format!(
                    "{} drop weight {} must be finite and non-negative",
                    rarity.name(),
                    tier.drop_weight
                )));
            }
            if !tier.stat_multiplier.is_finite() || tier.stat_multiplier < 0.0 {
                return Err(ConfigError::Rarity(format!(
                    "{} stat multiplier {} must be finite and non-negative",
                    rarity.name(),
                    tier.stat_multiplier
                )));
            }
            sum += tier.drop_weight;
        }

        if sum <= 0.0 {
            return Err(ConfigError::Rarity("drop weights sum to zero".into()));
        }
        let tolerance = WEIGHT_EPSILON * self.weight_total.abs().max(1.0);
        if !self.weight_total.is_finite() || (sum - self.weight_total).abs() > tolerance {
            return Err(ConfigError::Rarity(format!(
                "drop weights sum to {} but the documented total is {}",
                sum, self.weight_total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
        assert_eq!(Rarity::Rare.max(Rarity::Epic), Rarity::Epic);
        assert_eq!(Rarity::Epic.step_up(), Rarity::Legendary);
        assert_eq!(Rarity::Legendary.step_up(), Rarity::Legendary);
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(RarityTable::default().validate().is_ok());
    }

    #[test]
    fn test_distribution_at_zero_luck() {
        let table = RarityTable::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 5];
        let rolls = 100_000;
        for _ in 0..rolls {
            counts[table.roll(0.0, &mut rng) as usize] += 1;
        }

        let expected = [0.50, 0.30, 0.15, 0.04, 0.01];
        for (count, expected) in counts.iter().zip(expected) {
            let observed = *count as f64 / rolls as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "observed {} expected {}",
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_luck_is_monotonic() {
        let table = RarityTable::default();
        let mut previous = table.probability_at_least(Rarity::Rare, -100.0);
        for step in -19..=100 {
            let luck = step as f32 * 5.0;
            let p = table.probability_at_least(Rarity::Rare, luck);
            assert!(p >= previous, "P(>=Rare) dropped at luck {}", luck);
            previous = p;
        }
    }

    #[test]
    fn test_high_luck_rolls_more_rare_items() {
        let table = RarityTable::default();
        let mut rng = StdRng::seed_from_u64(7);
        let count_rare = |luck: f32, rng: &mut StdRng| {
            (0..20_000).filter(|_| table.roll(luck, rng) >= Rarity::Rare).count()
        };
        let unlucky = count_rare(0.0, &mut rng);
        let lucky = count_rare(300.0, &mut rng);
        assert!(lucky > unlucky);
    }

    #[test]
    fn test_negative_luck_clamps_to_zero() {
        let table = RarityTable::default();
        let weights = table.weights(-500.0);
        assert_eq!(weights[Rarity::Rare as usize], 0.0);
        assert_eq!(weights[Rarity::Common as usize], 50.0);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(table.roll(-500.0, &mut rng) <= Rarity::Uncommon);
        }
    }

    #[test]
    fn test_extreme_luck_stays_total() {
        let table = RarityTable::default();
        let mut rng = StdRng::seed_from_u64(3);
        table.roll(f32::INFINITY, &mut rng);
        table.roll(f32::NAN, &mut rng);
    }

    #[test]
    fn test_zero_weights_roll_common() {
        let mut table = RarityTable::default();
        for rarity in Rarity::ALL {
            let tier = match rarity {
                Rarity::Common => &mut table.common,
                Rarity::Uncommon => &mut table.uncommon,
                Rarity::Rare => &mut table.rare,
                Rarity::Epic => &mut table.epic,
                Rarity::Legendary => &mut table.legendary,
            };
            tier.drop_weight = 0.0;
        }
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(table.roll(0.0, &mut rng), Rarity::Common);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_total() {
        let mut table = RarityTable::default();
        table.common.drop_weight = 60.0;
        assert!(matches!(table.validate(), Err(ConfigError::Rarity(_))));
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut table = RarityTable::default();
        table.legendary.drop_weight = -1.0;
        table.common.drop_weight = 52.0;
        assert!(table.validate().is_err());
    }
}
