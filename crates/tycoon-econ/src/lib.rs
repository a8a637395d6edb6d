#![deny(warnings)]

//! Economic models: pricing, upgrades and purchases for Idle Tycoon.
//!
//! This crate provides:
//! - Exponential unit pricing per producer
//! - The per-item upgrade multiplier and its price curve
//! - Purchase and upgrade operations that reject (never clamp) when funds are short
//! - Production aggregation and ticking (`production`)
//! - The prestige credit engine (`prestige`)

use thiserror::Error;
use tracing::info;
use tycoon_core::{GameState, ItemCatalog, ItemDef};

pub mod prestige;
pub mod production;

/// Production multiplier gained per upgrade level.
pub const UPGRADE_MULTIPLIER_STEP: f64 = 1.5;
/// Upgrade price of level 0 relative to the item's base cost.
pub const UPGRADE_BASE_FACTOR: f64 = 5.0;
/// Upgrade price growth per level.
pub const UPGRADE_PRICE_GROWTH: f64 = 1.7;

/// Errors produced by purchase operations.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Price exceeds the money available; state is left untouched.
    #[error("not enough money: price {price:.2}, available {money:.2}")]
    InsufficientFunds { price: f64, money: f64 },
    /// Item is not part of the active catalog.
    #[error("unknown item: {0}")]
    ItemNotFound(String),
    /// Upgrades apply only to producers already owned.
    #[error("item {0} is not owned")]
    NotOwned(String),
}

/// Price of the next unit when `owned` units are already held.
///
/// Example:
/// let def = ItemDef::new("v", "V", 10.0, 1.15, 0.1);
/// assert_eq!(current_price(&def, 0), 10.0);
pub fn current_price(def: &ItemDef, owned: u32) -> f64 {
    def.base_cost * def.cost_multiplier.powf(f64::from(owned))
}

/// Production multiplier for an upgrade level (1.0 at level 0).
pub fn multiplier_for(level: u32) -> f64 {
    UPGRADE_MULTIPLIER_STEP.powf(f64::from(level))
}

/// Price of raising an item from `current_level` to the next level.
pub fn upgrade_price(def: &ItemDef, current_level: u32) -> f64 {
    def.base_cost * UPGRADE_BASE_FACTOR * UPGRADE_PRICE_GROWTH.powf(f64::from(current_level))
}

/// Buy one unit of `id`. Returns the price paid.
pub fn buy_item(state: &mut GameState, catalog: &ItemCatalog, id: &str) -> Result<f64, EconError> {
    let def = catalog
        .get(id)
        .ok_or_else(|| EconError::ItemNotFound(id.to_string()))?;
    let price = current_price(def, state.quantity_of(id));
    if state.money < price {
        return Err(EconError::InsufficientFunds {
            price,
            money: state.money,
        });
    }
    state.money -= price;
    let st = state.item_state_mut(id);
    st.quantity = st.quantity.saturating_add(1);
    info!(item = %def.id, price, owned = st.quantity, "bought producer");
    Ok(price)
}

/// Raise the upgrade level of an owned item by exactly one. Returns the price paid.
pub fn buy_upgrade(
    state: &mut GameState,
    catalog: &ItemCatalog,
    id: &str,
) -> Result<f64, EconError> {
    let def = catalog
        .get(id)
        .ok_or_else(|| EconError::ItemNotFound(id.to_string()))?;
    if state.quantity_of(id) == 0 {
        return Err(EconError::NotOwned(id.to_string()));
    }
    let price = upgrade_price(def, state.upgrade_level_of(id));
    if state.money < price {
        return Err(EconError::InsufficientFunds {
            price,
            money: state.money,
        });
    }
    state.money -= price;
    let st = state.item_state_mut(id);
    st.upgrade_level = st.upgrade_level.saturating_add(1);
    info!(item = %def.id, price, level = st.upgrade_level, "upgraded producer");
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vaporator() -> ItemDef {
        ItemDef::new("vaporator", "Moisture Vaporator", 10.0, 1.15, 0.1)
    }

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec![
            vaporator(),
            ItemDef::new("droid", "Salvage Droid", 60.0, 1.15, 0.7),
        ])
        .unwrap()
    }

    fn state_with(money: f64) -> GameState {
        let mut s = GameState::starting_at("lvl1");
        s.money = money;
        s
    }

    #[test]
    fn price_of_first_units() {
        let def = vaporator();
        assert!((current_price(&def, 0) - 10.00).abs() < 1e-9);
        assert!((current_price(&def, 1) - 11.50).abs() < 1e-9);
    }

    #[test]
    fn multiplier_identity_and_steps() {
        assert_eq!(multiplier_for(0), 1.0);
        assert_eq!(multiplier_for(1), 1.5);
        assert_eq!(multiplier_for(2), 2.25);
    }

    #[test]
    fn upgrade_price_level_zero_is_five_times_base() {
        assert_eq!(upgrade_price(&vaporator(), 0), 50.0);
        assert!((upgrade_price(&vaporator(), 1) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn buy_deducts_and_increments() {
        let cat = catalog();
        let mut s = state_with(25.0);
        let paid = buy_item(&mut s, &cat, "vaporator").unwrap();
        assert_eq!(paid, 10.0);
        assert_eq!(s.quantity_of("vaporator"), 1);
        assert!((s.money - 15.0).abs() < 1e-9);
        let paid = buy_item(&mut s, &cat, "vaporator").unwrap();
        assert!((paid - 11.5).abs() < 1e-9);
        assert_eq!(s.quantity_of("vaporator"), 2);
    }

    #[test]
    fn buy_rejected_without_funds() {
        let cat = catalog();
        let mut s = state_with(9.99);
        let before = s.clone();
        assert_eq!(
            buy_item(&mut s, &cat, "vaporator"),
            Err(EconError::InsufficientFunds {
                price: 10.0,
                money: 9.99
            })
        );
        assert_eq!(s, before);
    }

    #[test]
    fn buy_unknown_item() {
        let mut s = state_with(1e9);
        assert_eq!(
            buy_item(&mut s, &catalog(), "ghost"),
            Err(EconError::ItemNotFound("ghost".into()))
        );
        assert!(s.items.is_empty());
    }

    #[test]
    fn upgrade_requires_ownership() {
        let cat = catalog();
        let mut s = state_with(1e9);
        assert_eq!(
            buy_upgrade(&mut s, &cat, "droid"),
            Err(EconError::NotOwned("droid".into()))
        );
        assert_eq!(s.money, 1e9);
    }

    #[test]
    fn upgrade_is_single_step_even_when_rich() {
        let cat = catalog();
        let mut s = state_with(1e12);
        s.item_state_mut("vaporator").quantity = 3;
        let paid = buy_upgrade(&mut s, &cat, "vaporator").unwrap();
        assert_eq!(paid, 50.0);
        assert_eq!(s.upgrade_level_of("vaporator"), 1);
        assert_eq!(s.quantity_of("vaporator"), 3);
        assert_eq!(s.money, 1e12 - 50.0);
    }

    #[test]
    fn upgrade_rejected_without_funds() {
        let cat = catalog();
        let mut s = state_with(49.0);
        s.item_state_mut("vaporator").quantity = 1;
        let before = s.clone();
        assert!(matches!(
            buy_upgrade(&mut s, &cat, "vaporator"),
            Err(EconError::InsufficientFunds { .. })
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn curves_hold_past_i32_range() {
        let def = ItemDef::new("p", "P", 10.0, 1.000_000_1, 1.0);
        let edge = i32::MAX as u32;
        assert!(current_price(&def, edge + 1) > current_price(&def, edge));
        assert!(current_price(&def, u32::MAX) > current_price(&def, edge + 1));
        assert!(multiplier_for(edge + 1) >= multiplier_for(edge));
        assert!(multiplier_for(edge + 1) > 1.0);
        assert!(upgrade_price(&def, edge + 1) > 1.0);
    }

    #[test]
    fn huge_upgrade_level_is_never_free() {
        let cat = catalog();
        let mut s = state_with(1e12);
        let st = s.item_state_mut("vaporator");
        st.quantity = 5;
        st.upgrade_level = 1 << 31;
        let before = s.clone();
        assert!(matches!(
            buy_upgrade(&mut s, &cat, "vaporator"),
            Err(EconError::InsufficientFunds { .. })
        ));
        assert_eq!(s, before);
    }

    proptest! {
        #[test]
        fn price_strictly_increasing(owned in 0u32..200, cost in 0.01f64..1e6, mult in 1.01f64..3.0) {
            let def = ItemDef::new("p", "P", cost, mult, 1.0);
            prop_assert!(current_price(&def, owned + 1) > current_price(&def, owned));
        }

        #[test]
        fn multiplier_steps_by_one_and_a_half(level in 0u32..60) {
            let ratio = multiplier_for(level + 1) / multiplier_for(level);
            prop_assert!((ratio - 1.5).abs() < 1e-12);
        }

        #[test]
        fn upgrade_price_strictly_increasing(level in 0u32..100, cost in 0.01f64..1e6) {
            let def = ItemDef::new("p", "P", cost, 1.15, 1.0);
            prop_assert!(upgrade_price(&def, level + 1) > upgrade_price(&def, level));
        }

        #[test]
        fn money_never_negative_after_purchases(start in 0.0f64..10_000.0, attempts in 1usize..64) {
            let cat = catalog();
            let mut s = state_with(start);
            for i in 0..attempts {
                let id = if i % 3 == 0 { "droid" } else { "vaporator" };
                let _ = buy_item(&mut s, &cat, id);
                let _ = buy_upgrade(&mut s, &cat, id);
                prop_assert!(s.money >= 0.0);
            }
        }
    }
}
