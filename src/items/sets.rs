//! Item sets and set bonuses
//!
//! Equipping several pieces of the same set unlocks tiered bonuses. The active
//! tier is a step function of the equipped piece count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::StatBlock;
use crate::error::ConfigError;

/// A tier of set bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBonusTier {
    /// Pieces needed to activate
    pub required_pieces: u32,
    /// Stats granted while active
    #[serde(default)]
    pub bonus: StatBlock,
    /// Named effect the host applies while active
    #[serde(default)]
    pub special_effect: Option<String>,
}

/// Definition of an item set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSet {
    /// Display name of the set
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Tiers in strictly increasing `required_pieces` order
    pub tiers: Vec<SetBonusTier>,
}

impl ItemSet {
    /// Get the active tier (index and tier) based on equipped piece count
    pub fn active_tier(&self, count: u32) -> Option<(usize, &SetBonusTier)> {
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, t)| count >= t.required_pieces)
            .last()
    }
}

/// A set whose bonus is currently applied
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSetBonus {
    pub set_id: String,
    pub name: String,
    pub pieces: u32,
    pub tier_index: usize,
    pub tier: SetBonusTier,
}

/// All set definitions keyed by set id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetRegistry {
    sets: BTreeMap<String, ItemSet>,
}

impl SetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set_id: impl Into<String>, set: ItemSet) {
        self.sets.insert(set_id.into(), set);
    }

    pub fn get(&self, set_id: &str) -> Option<&ItemSet> {
        self.sets.get(set_id)
    }

    pub fn contains(&self, set_id: &str) -> bool {
        self.sets.contains_key(set_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemSet)> {
        self.sets.iter().map(|(id, set)| (id.as_str(), set))
    }

    /// Tier with the greatest requirement met by `count`, if any
    pub fn get_active_tier(&self, set_id: &str, count: u32) -> Option<&SetBonusTier> {
        self.active_tier_index(set_id, count)
            .and_then(|index| self.sets.get(set_id).map(|set| &set.tiers[index]))
    }

    pub fn active_tier_index(&self, set_id: &str, count: u32) -> Option<usize> {
        self.sets
            .get(set_id)
            .and_then(|set| set.active_tier(count))
            .map(|(index, _)| index)
    }

    /// Tiers must be non-empty, positive and strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, set) in self.iter() {
            if set.tiers.is_empty() {
                return Err(ConfigError::set(id, "a set needs at least one tier"));
            }
            let mut previous = 0;
            for tier in &set.tiers {
                if tier.required_pieces <= previous {
                    return Err(ConfigError::set(
                        id,
                        format!(
                            "tier requiring {} pieces must need more than {}",
                            tier.required_pieces, previous
                        ),
                    ));
                }
                if let Some(stat) = tier.bonus.invalid_field() {
                    return Err(ConfigError::set(
                        id,
                        format!("bonus stat `{}` must be finite and non-negative", stat),
                    ));
                }
                previous = tier.required_pieces;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samurai() -> ItemSet {
        ItemSet {
            name: "Neon Samurai".into(),
            description: String::new(),
            tiers: vec![
                SetBonusTier {
                    required_pieces: 2,
                    bonus: StatBlock { damage: 5.0, ..StatBlock::ZERO },
                    special_effect: None,
                },
                SetBonusTier {
                    required_pieces: 3,
                    bonus: StatBlock { damage: 12.0, crit: 5.0, ..StatBlock::ZERO },
                    special_effect: Some("blade_dash".into()),
                },
            ],
        }
    }

    #[test]
    fn test_active_tier_is_step_function() {
        let mut registry = SetRegistry::new();
        registry.insert("neon_samurai", samurai());

        assert_eq!(registry.get_active_tier("neon_samurai", 0), None);
        assert_eq!(registry.get_active_tier("neon_samurai", 1), None);
        assert_eq!(registry.active_tier_index("neon_samurai", 2), Some(0));
        assert_eq!(registry.active_tier_index("neon_samurai", 3), Some(1));
        assert_eq!(registry.active_tier_index("neon_samurai", 9), Some(1));
        assert_eq!(registry.get_active_tier("unknown", 5), None);
    }

    #[test]
    fn test_greatest_requirement_wins_even_if_weaker() {
        let mut set = samurai();
        set.tiers[1].bonus = StatBlock { damage: 1.0, ..StatBlock::ZERO };
        let (index, tier) = set.active_tier(3).unwrap();
        assert_eq!(index, 1);
        assert_eq!(tier.bonus.damage, 1.0);
    }

    #[test]
    fn test_validate_rejects_unordered_tiers() {
        let mut set = samurai();
        set.tiers.swap(0, 1);
        let mut registry = SetRegistry::new();
        registry.insert("neon_samurai", set);
        assert!(matches!(registry.validate(), Err(ConfigError::Set { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_requirement() {
        let mut set = samurai();
        set.tiers[1].required_pieces = 2;
        let mut registry = SetRegistry::new();
        registry.insert("neon_samurai", set);
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_set() {
        let mut registry = SetRegistry::new();
        registry.insert(
            "empty",
            ItemSet { name: "Empty".into(), description: String::new(), tiers: Vec::new() },
        );
        assert!(registry.validate().is_err());
    }
}
