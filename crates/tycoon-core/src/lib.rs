#![deny(warnings)]

//! Core domain models and invariants for Idle Tycoon.
//!
//! This crate defines the serializable run state, the immutable producer and
//! level tables, and validation helpers guaranteeing the basic invariants the
//! economy engine relies on.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

pub mod campaign;
pub mod fmt;

pub use campaign::Campaign;
pub use fmt::format_number;

/// Immutable definition of a purchasable producer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Identifier, unique within its catalog, e.g. "vaporator".
    pub id: String,
    /// Display name.
    pub name: String,
    /// Price of the first unit (> 0).
    pub base_cost: f64,
    /// Price growth per owned unit (> 1).
    pub cost_multiplier: f64,
    /// Currency produced per unit per second before multipliers (>= 0).
    pub base_production_per_second: f64,
}

impl ItemDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_cost: f64,
        cost_multiplier: f64,
        base_production_per_second: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_cost,
            cost_multiplier,
            base_production_per_second,
        }
    }
}

/// Ordered set of producers available to the active level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemCatalog {
    items: Vec<ItemDef>,
}

impl ItemCatalog {
    /// Build a catalog; every item must be valid and ids unique.
    pub fn new(items: Vec<ItemDef>) -> Result<Self, ValidationError> {
        validate_items(&items)?;
        Ok(Self { items })
    }

    /// Catalog holding exactly the producers of `level`.
    pub fn for_level(level: &LevelDef) -> Result<Self, ValidationError> {
        Self::new(level.producers.clone())
    }

    pub fn all(&self) -> &[ItemDef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lookup that tolerates unknown ids.
    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|d| d.id == id)
    }

    /// Strict lookup; an unknown id is an integrity error.
    pub fn by_id(&self, id: &str) -> Result<&ItemDef, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))
    }
}

/// Per-item progress within the current run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    /// Foreign key into the active catalog.
    pub item_id: String,
    /// Units owned; zero means "not owned".
    pub quantity: u32,
    /// Upgrade level within this run.
    #[serde(default)]
    pub upgrade_level: u32,
}

impl ItemState {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            quantity: 0,
            upgrade_level: 0,
        }
    }
}

/// A campaign stage with its own producers and money goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    /// Unique level identifier, e.g. "lvl1".
    pub id: String,
    /// Display name.
    pub name: String,
    /// Money required to complete the level (> 0).
    pub goal_money: f64,
    /// Producers in shop order; the first one is seeded on entry.
    pub producers: Vec<ItemDef>,
}

/// The single-player run state. Everything here is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Spendable currency (>= 0).
    pub money: f64,
    /// Cumulative currency ever produced; never decremented.
    pub lifetime_earnings: f64,
    /// Number of prestige resets performed.
    pub prestiges: u32,
    /// Prestige credits currently held.
    pub prestige_credits: u32,
    /// High-water mark of credits ever awarded.
    pub prestige_credits_earned_historical: u32,
    /// Active campaign level.
    pub current_level_id: String,
    /// Levels reached during this run.
    pub unlocked_levels: BTreeSet<String>,
    /// Lazily created per-item states.
    pub items: Vec<ItemState>,
}

impl GameState {
    /// Fresh state positioned on `level_id` with nothing owned.
    pub fn starting_at(level_id: impl Into<String>) -> Self {
        let level_id = level_id.into();
        let mut unlocked_levels = BTreeSet::new();
        unlocked_levels.insert(level_id.clone());
        Self {
            money: 0.0,
            lifetime_earnings: 0.0,
            prestiges: 0,
            prestige_credits: 0,
            prestige_credits_earned_historical: 0,
            current_level_id: level_id,
            unlocked_levels,
            items: Vec::new(),
        }
    }

    pub fn item_state(&self, id: &str) -> Option<&ItemState> {
        self.items.iter().find(|s| s.item_id == id)
    }

    /// Returns the state for `id`, creating an empty one on first reference.
    pub fn item_state_mut(&mut self, id: &str) -> &mut ItemState {
        let idx = match self.items.iter().position(|s| s.item_id == id) {
            Some(idx) => idx,
            None => {
                self.items.push(ItemState::new(id));
                self.items.len() - 1
            }
        };
        &mut self.items[idx]
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.item_state(id).map_or(0, |s| s.quantity)
    }

    pub fn upgrade_level_of(&self, id: &str) -> u32 {
        self.item_state(id).map_or(0, |s| s.upgrade_level)
    }

    /// Credit produced currency to both the wallet and the lifetime total.
    pub fn earn(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.money += amount;
            self.lifetime_earnings += amount;
        }
    }

    /// Discard the run: zero money and drop every item state.
    pub fn clear_run(&mut self) {
        self.money = 0.0;
        self.items.clear();
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(String),
    /// Base cost must be strictly positive.
    #[error("item {0}: base cost must be > 0")]
    NonPositiveCost(String),
    /// Cost multiplier must exceed 1 so prices keep rising.
    #[error("item {0}: cost multiplier must be > 1")]
    MultiplierTooSmall(String),
    /// Production rate must be non-negative.
    #[error("item {0}: production must be >= 0")]
    NegativeProduction(String),
    /// Level goal must be strictly positive.
    #[error("level {0}: goal must be > 0")]
    NonPositiveGoal(String),
    /// Identifiers must not be blank.
    #[error("blank identifier")]
    BlankId,
    /// Item ids must be unique within a level.
    #[error("duplicate item id: {0}")]
    DuplicateItem(String),
    /// Level ids must be unique within a campaign.
    #[error("duplicate level id: {0}")]
    DuplicateLevel(String),
    /// A campaign needs at least one level.
    #[error("campaign has no levels")]
    EmptyCampaign,
    /// Current level must be part of the campaign.
    #[error("unknown current level: {0}")]
    UnknownLevel(String),
    /// Current level must be unlocked.
    #[error("current level {0} is not unlocked")]
    LevelNotUnlocked(String),
    /// Money values must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Credits held can never exceed credits ever awarded.
    #[error("prestige credits {credits} exceed historical total {historical}")]
    CreditsExceedHistorical { credits: u32, historical: u32 },
}

/// Errors raised by lookups and campaign loading.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("level not found: {0}")]
    LevelNotFound(String),
    #[error("invalid campaign: {0}")]
    Invalid(#[from] ValidationError),
    #[error("campaign parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(e: serde_yaml::Error) -> Self {
        CoreError::Parse(e.to_string())
    }
}

/// Validate a producer definition.
pub fn validate_item_def(def: &ItemDef) -> Result<(), ValidationError> {
    if def.id.trim().is_empty() {
        return Err(ValidationError::BlankId);
    }
    if !(def.base_cost.is_finite()
        && def.cost_multiplier.is_finite()
        && def.base_production_per_second.is_finite())
    {
        return Err(ValidationError::NonFinite(def.id.clone()));
    }
    if def.base_cost <= 0.0 {
        return Err(ValidationError::NonPositiveCost(def.id.clone()));
    }
    if def.cost_multiplier <= 1.0 {
        return Err(ValidationError::MultiplierTooSmall(def.id.clone()));
    }
    if def.base_production_per_second < 0.0 {
        return Err(ValidationError::NegativeProduction(def.id.clone()));
    }
    Ok(())
}

/// Validate a level and its producers.
pub fn validate_level(level: &LevelDef) -> Result<(), ValidationError> {
    if level.id.trim().is_empty() {
        return Err(ValidationError::BlankId);
    }
    if !level.goal_money.is_finite() {
        return Err(ValidationError::NonFinite(level.id.clone()));
    }
    if level.goal_money <= 0.0 {
        return Err(ValidationError::NonPositiveGoal(level.id.clone()));
    }
    validate_items(&level.producers)
}

fn validate_items(items: &[ItemDef]) -> Result<(), ValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for def in items {
        validate_item_def(def)?;
        if !seen.insert(def.id.as_str()) {
            return Err(ValidationError::DuplicateItem(def.id.clone()));
        }
    }
    Ok(())
}

/// Validate the ordered level table.
pub fn validate_levels(levels: &[LevelDef]) -> Result<(), ValidationError> {
    if levels.is_empty() {
        return Err(ValidationError::EmptyCampaign);
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for level in levels {
        validate_level(level)?;
        if !seen.insert(level.id.as_str()) {
            return Err(ValidationError::DuplicateLevel(level.id.clone()));
        }
    }
    Ok(())
}

/// Validate a (typically freshly loaded) state against a campaign.
pub fn validate_state(state: &GameState, campaign: &Campaign) -> Result<(), ValidationError> {
    if !(state.money.is_finite() && state.lifetime_earnings.is_finite()) {
        return Err(ValidationError::NonFinite("game state".to_string()));
    }
    if state.money < 0.0 || state.lifetime_earnings < 0.0 {
        return Err(ValidationError::NegativeMoney);
    }
    if campaign.level(&state.current_level_id).is_err() {
        return Err(ValidationError::UnknownLevel(state.current_level_id.clone()));
    }
    if !state.unlocked_levels.contains(&state.current_level_id) {
        return Err(ValidationError::LevelNotUnlocked(
            state.current_level_id.clone(),
        ));
    }
    if let Some(ghost) = state
        .unlocked_levels
        .iter()
        .find(|id| campaign.level(id).is_err())
    {
        return Err(ValidationError::UnknownLevel(ghost.clone()));
    }
    if state.prestige_credits > state.prestige_credits_earned_historical {
        return Err(ValidationError::CreditsExceedHistorical {
            credits: state.prestige_credits,
            historical: state.prestige_credits_earned_historical,
        });
    }
    Ok(())
}
