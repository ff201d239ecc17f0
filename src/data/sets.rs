//! Built-in item sets

use crate::items::{ItemSet, SetBonusTier, SetRegistry, StatBlock};

/// Create the default set definitions (hardcoded fallback)
pub fn default_sets() -> SetRegistry {
    let mut sets = SetRegistry::new();

    sets.insert(
        "neon_samurai",
        ItemSet {
            name: "Neon Samurai".to_string(),
            description: "Blade, visor and plating of a street duelist.".to_string(),
            tiers: vec![
                SetBonusTier {
                    required_pieces: 2,
                    bonus: StatBlock { damage: 5.0, crit: 5.0, ..StatBlock::ZERO },
                    special_effect: None,
                },
                SetBonusTier {
                    required_pieces: 3,
                    bonus: StatBlock { damage: 12.0, crit: 10.0, speed: 5.0, ..StatBlock::ZERO },
                    special_effect: Some("blade_dash".to_string()),
                },
            ],
        },
    );

    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets_validate() {
        let sets = default_sets();
        assert!(sets.validate().is_ok());
        assert_eq!(sets.get_active_tier("neon_samurai", 1), None);
        assert_eq!(sets.get_active_tier("neon_samurai", 2).unwrap().required_pieces, 2);
        assert_eq!(sets.get_active_tier("neon_samurai", 5).unwrap().required_pieces, 3);
    }
}
