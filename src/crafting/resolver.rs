//! Crafting resolver
//!
//! Validates recipes against the inventory, consumes ingredients up front and
//! runs at most one timed craft. State machine:
//! `Idle -> InProgress -> (completed | cancelled) -> Idle`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::recipe::{CraftingRecipe, ResultRarity};
use crate::data::GameData;
use crate::error::CraftError;
use crate::events::{EconomyObserver, WorldPosition};
use crate::items::{ConsumedPart, Inventory, ItemFactory, LootResult, Rarity};

/// Ingredient stacks taken for one recipe line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedIngredient {
    pub item_type: String,
    pub parts: Vec<ConsumedPart>,
}

impl ConsumedIngredient {
    pub fn total(&self) -> u32 {
        self.parts.iter().map(|p| p.amount).sum()
    }
}

/// The craft currently running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingProcess {
    recipe_id: String,
    elapsed: Duration,
    duration: Duration,
    consumed: Vec<ConsumedIngredient>,
}

impl CraftingProcess {
    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Ingredients already taken from the inventory
    pub fn consumed(&self) -> &[ConsumedIngredient] {
        &self.consumed
    }
}

/// Resolver state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CraftState {
    #[default]
    Idle,
    InProgress(CraftingProcess),
}

/// A finished craft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftedItem {
    pub recipe_id: String,
    pub item_type: String,
    pub rarity: Rarity,
    pub amount: u32,
    /// Units that landed in the inventory
    pub stored: u32,
    /// Units dropped in the world for lack of space
    pub spilled: u32,
}

/// Outcome of starting a craft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftStart {
    Started { duration: Duration },
    /// Zero-cost recipes finish immediately
    Completed(CraftedItem),
}

/// Everything a craft step touches besides the resolver itself
pub struct CraftContext<'a, R: Rng> {
    pub inventory: &'a mut Inventory,
    pub factory: &'a mut ItemFactory,
    pub rng: &'a mut R,
    pub observer: &'a mut dyn EconomyObserver,
    /// Bonus luck for Random result rarities
    pub bonus_luck: f32,
    /// Economy clock, stamped on crafted items
    pub now_ms: u64,
    /// Where overflowing results are dropped
    pub position: WorldPosition,
}

/// Refunded units for a consumed amount: `floor(consumed * rate)`
pub fn refund_amount(consumed: u32, rate: f32) -> u32 {
    let rate = rate.clamp(0.0, 1.0) as f64;
    // Nudge past float error so 10 * 0.7 stays 7
    ((consumed as f64) * rate + 1e-6).floor() as u32
}

/// Rounded unit-weighted average rarity of the consumed stacks, with a chance
/// to step up one tier
pub fn inherit_rarity(consumed: &[ConsumedIngredient], upgrade_chance: f32, rng: &mut impl Rng) -> Rarity {
    let (weighted, units) = consumed
        .iter()
        .flat_map(|c| c.parts.iter())
        .fold((0u64, 0u64), |(weighted, units), part| {
            (
                weighted + part.rarity as u64 * part.amount as u64,
                units + part.amount as u64,
            )
        });
    if units == 0 {
        return Rarity::Common;
    }

    let average = weighted as f64 / units as f64;
    let base = Rarity::from_index(average.round() as usize);
    let chance = upgrade_chance.clamp(0.0, 1.0) as f64;
    if chance > 0.0 && rng.gen_bool(chance) {
        base.step_up()
    } else {
        base
    }
}

/// Runs crafts for one crafter
#[derive(Debug)]
pub struct CraftingResolver {
    data: Arc<GameData>,
    unlocked: BTreeSet<String>,
    level: u32,
    state: CraftState,
}

impl CraftingResolver {
    pub fn new(data: Arc<GameData>) -> Self {
        let unlocked = data.recipes.default_unlocked();
        let level = data.config.crafting.starting_level;
        Self {
            data,
            unlocked,
            level,
            state: CraftState::Idle,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    pub fn is_unlocked(&self, recipe_id: &str) -> bool {
        self.unlocked.contains(recipe_id)
    }

    pub fn unlocked_recipes(&self) -> impl Iterator<Item = &str> {
        self.unlocked.iter().map(String::as_str)
    }

    /// Unlock a recipe; returns false if it is unknown or already unlocked
    pub fn unlock_recipe(&mut self, recipe_id: &str) -> bool {
        if !self.data.recipes.contains(recipe_id) {
            log::warn!("Cannot unlock unknown recipe `{}`", recipe_id);
            return false;
        }
        let added = self.unlocked.insert(recipe_id.to_string());
        if added {
            log::info!("Unlocked recipe {}", recipe_id);
        }
        added
    }

    pub fn state(&self) -> &CraftState {
        &self.state
    }

    pub fn active(&self) -> Option<&CraftingProcess> {
        match &self.state {
            CraftState::InProgress(process) => Some(process),
            CraftState::Idle => None,
        }
    }

    pub fn is_crafting(&self) -> bool {
        self.active().is_some()
    }

    /// Real time a recipe takes
    pub fn duration_of(&self, recipe: &CraftingRecipe) -> Duration {
        let seconds = recipe.crafting_cost * self.data.config.crafting.time_multiplier;
        if seconds > 0.0 {
            Duration::try_from_secs_f32(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Check a recipe without side effects
    ///
    /// Recipe known and unlocked, crafter level high enough, enough of each
    /// ingredient at the required rarity (summed across stacks), enough coins,
    /// and no craft already running.
    pub fn can_craft(&self, inventory: &Inventory, recipe_id: &str) -> Result<(), CraftError> {
        if let Some(process) = self.active() {
            return Err(CraftError::AlreadyCrafting(process.recipe_id.clone()));
        }
        let recipe = self
            .data
            .recipes
            .get(recipe_id)
            .ok_or_else(|| CraftError::UnknownRecipe(recipe_id.to_string()))?;
        if !self.is_unlocked(recipe_id) {
            return Err(CraftError::Locked(recipe_id.to_string()));
        }
        if self.level < recipe.required_level {
            return Err(CraftError::LevelTooLow { required: recipe.required_level, current: self.level });
        }
        for ingredient in &recipe.ingredients {
            let available = inventory.count_of(&ingredient.item_type, ingredient.min_rarity);
            if available < ingredient.amount {
                return Err(CraftError::InsufficientIngredient {
                    item_type: ingredient.item_type.clone(),
                    min_rarity: ingredient.min_rarity,
                    required: ingredient.amount,
                    available,
                });
            }
        }
        if inventory.coins() < recipe.currency_cost {
            return Err(CraftError::InsufficientCoins {
                required: recipe.currency_cost,
                available: inventory.coins(),
            });
        }
        Ok(())
    }

    /// Start a craft
    ///
    /// Consumes ingredients (oldest stacks first) and coins immediately. Any
    /// validation failure leaves everything untouched.
    pub fn start_craft<R: Rng>(
        &mut self,
        recipe_id: &str,
        ctx: &mut CraftContext<'_, R>,
    ) -> Result<CraftStart, CraftError> {
        self.can_craft(ctx.inventory, recipe_id)?;
        let data = Arc::clone(&self.data);
        let recipe = data
            .recipes
            .get(recipe_id)
            .ok_or_else(|| CraftError::UnknownRecipe(recipe_id.to_string()))?;

        let consumed: Vec<ConsumedIngredient> = recipe
            .ingredients
            .iter()
            .map(|ingredient| ConsumedIngredient {
                item_type: ingredient.item_type.clone(),
                parts: ctx.inventory.remove_matching(
                    &ingredient.item_type,
                    ingredient.min_rarity,
                    ingredient.amount,
                ),
            })
            .collect();
        if recipe.currency_cost > 0 {
            ctx.inventory.spend_coins(recipe.currency_cost);
        }

        let duration = self.duration_of(recipe);
        log::info!("Started crafting {} ({:.1}s)", recipe_id, duration.as_secs_f32());
        ctx.observer.craft_started(recipe_id, duration);

        if duration.is_zero() {
            let crafted = self.finish(recipe_id, recipe, &consumed, ctx);
            return Ok(CraftStart::Completed(crafted));
        }

        self.state = CraftState::InProgress(CraftingProcess {
            recipe_id: recipe_id.to_string(),
            elapsed: Duration::ZERO,
            duration,
            consumed,
        });
        Ok(CraftStart::Started { duration })
    }

    /// Advance the running craft; returns the result when it completes
    pub fn tick<R: Rng>(&mut self, delta: Duration, ctx: &mut CraftContext<'_, R>) -> Option<CraftedItem> {
        let CraftState::InProgress(process) = &mut self.state else {
            return None;
        };
        process.elapsed = process.elapsed.saturating_add(delta);
        if process.elapsed < process.duration {
            return None;
        }

        let CraftState::InProgress(process) = std::mem::take(&mut self.state) else {
            return None;
        };
        let data = Arc::clone(&self.data);
        match data.recipes.get(&process.recipe_id) {
            Some(recipe) => Some(self.finish(&process.recipe_id, recipe, &process.consumed, ctx)),
            None => {
                log::warn!("Recipe `{}` vanished mid-craft", process.recipe_id);
                None
            }
        }
    }

    /// Abort the running craft and refund part of each ingredient line
    ///
    /// Coins are not refunded.
    pub fn cancel_craft<R: Rng>(&mut self, ctx: &mut CraftContext<'_, R>) -> Result<Vec<LootResult>, CraftError> {
        let CraftState::InProgress(process) = std::mem::take(&mut self.state) else {
            return Err(CraftError::NotCrafting);
        };

        let rate = self.data.config.crafting.refund_rate;
        let mut refunded: Vec<LootResult> = Vec::new();
        for ingredient in &process.consumed {
            let mut remaining = refund_amount(ingredient.total(), rate);
            for part in &ingredient.parts {
                if remaining == 0 {
                    break;
                }
                let amount = remaining.min(part.amount);
                remaining -= amount;
                match refunded
                    .iter_mut()
                    .find(|r| r.item_type == ingredient.item_type && r.rarity == part.rarity)
                {
                    Some(existing) => existing.amount += amount,
                    None => refunded.push(LootResult::new(ingredient.item_type.clone(), part.rarity, amount)),
                }
            }
        }

        for result in &refunded {
            ctx.inventory.add_or_spill(ctx.factory, ctx.observer, result, ctx.now_ms, ctx.position);
        }
        log::info!("Cancelled crafting {}, refunded {} stacks", process.recipe_id, refunded.len());
        ctx.observer.craft_cancelled(&process.recipe_id, &refunded);
        Ok(refunded)
    }

    /// Completion fraction in `[0, 1]`; 0 while idle
    pub fn progress(&self) -> f32 {
        match self.active() {
            None => 0.0,
            Some(process) if process.duration.is_zero() => 1.0,
            Some(process) => {
                (process.elapsed.as_secs_f64() / process.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
            }
        }
    }

    /// Time left on the running craft; zero while idle
    pub fn remaining_time(&self) -> Duration {
        self.active()
            .map(|p| p.duration.saturating_sub(p.elapsed))
            .unwrap_or(Duration::ZERO)
    }

    fn resolve_rarity<R: Rng>(
        &self,
        recipe: &CraftingRecipe,
        consumed: &[ConsumedIngredient],
        ctx: &mut CraftContext<'_, R>,
    ) -> Rarity {
        match recipe.result_rarity {
            ResultRarity::Fixed(rarity) => rarity,
            ResultRarity::Random => self.data.config.rarity.roll(ctx.bonus_luck, &mut *ctx.rng),
            ResultRarity::Inherit => inherit_rarity(
                consumed,
                self.data.config.crafting.inherit_upgrade_chance,
                &mut *ctx.rng,
            ),
        }
    }

    fn finish<R: Rng>(
        &self,
        recipe_id: &str,
        recipe: &CraftingRecipe,
        consumed: &[ConsumedIngredient],
        ctx: &mut CraftContext<'_, R>,
    ) -> CraftedItem {
        let rarity = self.resolve_rarity(recipe, consumed, ctx);
        let result = LootResult::new(recipe.result_item.clone(), rarity, recipe.result_amount);
        let delivery = ctx.inventory.add_or_spill(ctx.factory, ctx.observer, &result, ctx.now_ms, ctx.position);

        let crafted = CraftedItem {
            recipe_id: recipe_id.to_string(),
            item_type: result.item_type,
            rarity,
            amount: result.amount,
            stored: delivery.stored,
            spilled: delivery.spilled,
        };
        log::info!(
            "Finished crafting {}: {}x {} ({})",
            recipe_id,
            crafted.amount,
            crafted.item_type,
            rarity.name()
        );
        ctx.observer.craft_completed(&crafted);
        crafted
    }

    /// Reinstate unlocked recipes and a running craft from a save
    pub(crate) fn restore(&mut self, unlocked: &[String], active: Option<CraftingProcess>) -> Result<(), String> {
        for recipe_id in unlocked {
            if self.data.recipes.contains(recipe_id) {
                self.unlocked.insert(recipe_id.clone());
            } else {
                log::warn!("Save unlocks unknown recipe `{}`, skipping", recipe_id);
            }
        }
        if let Some(process) = active {
            if !self.data.recipes.contains(&process.recipe_id) {
                return Err(format!("running craft uses unknown recipe `{}`", process.recipe_id));
            }
            self.state = CraftState::InProgress(process);
        }
        Ok(())
    }
}
