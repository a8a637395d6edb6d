//! Production aggregation and time integration.

use crate::multiplier_for;
use crate::prestige::prod_multiplier;
use tracing::debug;
use tycoon_core::{GameState, ItemCatalog, ItemDef};

/// Money granted by one manual collect action.
pub const MANUAL_COLLECT: f64 = 1.0;

/// Current output of one owned producer with every multiplier applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemProduction<'a> {
    pub def: &'a ItemDef,
    pub quantity: u32,
    pub upgrade_level: u32,
    /// Per unit, per second.
    pub per_unit: f64,
    /// All units, per second.
    pub total: f64,
}

/// Total currency per second across owned items.
///
/// Items missing from `catalog` (left over from another level) are skipped.
pub fn total_production_per_second(state: &GameState, catalog: &ItemCatalog) -> f64 {
    let base: f64 = state
        .items
        .iter()
        .filter(|st| st.quantity > 0)
        .filter_map(|st| {
            catalog.get(&st.item_id).map(|def| {
                def.base_production_per_second
                    * f64::from(st.quantity)
                    * multiplier_for(st.upgrade_level)
            })
        })
        .sum();
    base * prod_multiplier(state.prestige_credits)
}

/// Per-item breakdown in catalog order, owned items only.
pub fn item_production<'a>(state: &GameState, catalog: &'a ItemCatalog) -> Vec<ItemProduction<'a>> {
    let prestige = prod_multiplier(state.prestige_credits);
    catalog
        .all()
        .iter()
        .filter_map(|def| {
            let st = state.item_state(&def.id)?;
            if st.quantity == 0 {
                return None;
            }
            let per_unit =
                def.base_production_per_second * multiplier_for(st.upgrade_level) * prestige;
            Some(ItemProduction {
                def,
                quantity: st.quantity,
                upgrade_level: st.upgrade_level,
                per_unit,
                total: per_unit * f64::from(st.quantity),
            })
        })
        .collect()
}

/// Advance the economy by `dt` seconds. Returns the amount produced.
pub fn tick(state: &mut GameState, catalog: &ItemCatalog, dt: f64) -> f64 {
    if !(dt.is_finite() && dt > 0.0) {
        return 0.0;
    }
    let produced = total_production_per_second(state, catalog) * dt;
    state.earn(produced);
    debug!(dt, produced, money = state.money, "tick");
    produced
}

/// Manual collect: a fixed amount straight into money and lifetime earnings.
pub fn collect(state: &mut GameState) -> f64 {
    state.earn(MANUAL_COLLECT);
    MANUAL_COLLECT
}
