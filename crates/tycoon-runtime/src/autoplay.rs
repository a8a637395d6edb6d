//! Greedy headless player used for simulations and benchmarks.

use crate::{Kpi, LevelOffer, RuntimeError, Session};
use tracing::{debug, info};
use tycoon_econ::{current_price, multiplier_for, prestige, upgrade_price};

/// Cap on decisions taken between two simulated steps.
const MAX_ACTIONS_PER_STEP: usize = 256;

/// One decision of the headless player.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    AdvanceLevel,
    Prestige,
    Buy(String),
    Upgrade(String),
    Collect,
    Wait,
}

/// Production gained per unit of money spent: higher is better.
pub fn utility(added_rate: f64, price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    added_rate / price
}

/// Pick the next action for `session`.
///
/// Level goals are taken as soon as they are offered. Prestige happens once
/// the campaign is complete. Otherwise money goes to the affordable purchase
/// with the best rate-per-price; with nothing affordable the player waits, or
/// collects by hand while nothing produces.
pub fn next_action(session: &Session) -> Result<Action, RuntimeError> {
    match session.level_offer()? {
        LevelOffer::Advance { .. } => return Ok(Action::AdvanceLevel),
        LevelOffer::CampaignComplete if session.prestige_available() > 0 => {
            return Ok(Action::Prestige)
        }
        _ => {}
    }

    let state = session.state();
    let bonus = prestige::prod_multiplier(state.prestige_credits);
    let mut best: Option<(f64, Action)> = None;
    for def in session.catalog().all() {
        let qty = state.quantity_of(&def.id);
        let lvl = state.upgrade_level_of(&def.id);

        let price = current_price(def, qty);
        if state.money >= price {
            let unit_rate = def.base_production_per_second * multiplier_for(lvl) * bonus;
            consider(&mut best, utility(unit_rate, price), Action::Buy(def.id.clone()));
        }

        let price = upgrade_price(def, lvl);
        if qty > 0 && state.money >= price {
            let gained = def.base_production_per_second
                * f64::from(qty)
                * (multiplier_for(lvl + 1) - multiplier_for(lvl))
                * bonus;
            consider(&mut best, utility(gained, price), Action::Upgrade(def.id.clone()));
        }
    }

    Ok(match best {
        Some((_, action)) => action,
        None if session.rate() <= 0.0 => Action::Collect,
        None => Action::Wait,
    })
}

fn consider(best: &mut Option<(f64, Action)>, score: f64, action: Action) {
    if score <= 0.0 {
        return;
    }
    if best.as_ref().map_or(true, |(s, _)| score > *s) {
        *best = Some((score, action));
    }
}

/// Carry out `action`. Returns false when nothing changed.
pub fn apply(session: &mut Session, action: &Action) -> Result<bool, RuntimeError> {
    Ok(match action {
        Action::AdvanceLevel => session.advance_level()?.is_some(),
        Action::Prestige => session.prestige()? > 0,
        Action::Buy(id) => {
            session.buy(id)?;
            true
        }
        Action::Upgrade(id) => {
            session.upgrade(id)?;
            true
        }
        Action::Collect => {
            session.collect();
            true
        }
        Action::Wait => false,
    })
}

/// Simulate `seconds` of play in steps of `step` seconds with the greedy
/// player, then report the final KPIs.
pub fn run_headless(session: &mut Session, seconds: f64, step: f64) -> Result<Kpi, RuntimeError> {
    let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
    let mut remaining = seconds.max(0.0);
    let mut decisions = 0u64;
    while remaining > 0.0 {
        for _ in 0..MAX_ACTIONS_PER_STEP {
            let action = next_action(session)?;
            // One click per step keeps collecting from dominating the loop.
            let once = action == Action::Collect;
            if !apply(session, &action)? {
                break;
            }
            decisions += 1;
            debug!(?action, "autoplay");
            if once {
                break;
            }
        }
        let dt = step.min(remaining);
        session.advance(dt);
        remaining -= dt;
    }
    let kpi = session.snapshot()?;
    info!(
        decisions,
        level = %kpi.level_id,
        lifetime = kpi.lifetime_earnings,
        "headless run finished"
    );
    Ok(kpi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::Settings;
    use tycoon_core::{Campaign, ItemDef, LevelDef};

    fn quiet() -> Settings {
        Settings { autosave_seconds: 0 }
    }

    fn small_campaign() -> Campaign {
        let level = |id: &str, goal: f64, first: &str| LevelDef {
            id: id.to_string(),
            name: id.to_string(),
            goal_money: goal,
            producers: vec![
                ItemDef::new(first, first, 10.0, 1.15, 1.0),
                ItemDef::new(format!("{first}2"), "Big", 100.0, 1.15, 12.0),
            ],
        };
        Campaign::new(vec![level("l1", 200.0, "a"), level("l2", 500.0, "b")]).unwrap()
    }

    #[test]
    fn utility_prefers_cheaper_rate() {
        assert!(utility(1.0, 10.0) > utility(1.0, 20.0));
        assert_eq!(utility(1.0, 0.0), 0.0);
    }

    #[test]
    fn collects_when_broke_and_idle() {
        let s = Session::new_game(small_campaign(), quiet(), None).unwrap();
        assert_eq!(next_action(&s).unwrap(), Action::Collect);
    }

    #[test]
    fn buys_best_affordable_option() {
        let mut s = Session::new_game(small_campaign(), quiet(), None).unwrap();
        for _ in 0..10 {
            s.collect();
        }
        assert_eq!(next_action(&s).unwrap(), Action::Buy("a".into()));
    }

    #[test]
    fn waits_for_better_option_when_producing() {
        let mut s = Session::new_game(small_campaign(), quiet(), None).unwrap();
        for _ in 0..10 {
            s.collect();
        }
        s.buy("a").unwrap();
        // Rate is positive and nothing is affordable yet.
        assert_eq!(next_action(&s).unwrap(), Action::Wait);
    }

    #[test]
    fn advances_when_goal_met() {
        let mut s = Session::new_game(small_campaign(), quiet(), None).unwrap();
        for _ in 0..200 {
            s.collect();
        }
        assert_eq!(next_action(&s).unwrap(), Action::AdvanceLevel);
        assert!(apply(&mut s, &Action::AdvanceLevel).unwrap());
        assert_eq!(s.state().current_level_id, "l2");
        assert!(!apply(&mut s, &Action::Wait).unwrap());
    }

    #[test]
    fn headless_run_makes_progress_on_builtin_campaign() {
        let mut s = Session::new_game(Campaign::builtin().unwrap(), quiet(), None).unwrap();
        let kpi = run_headless(&mut s, 3_600.0, 1.0).unwrap();
        assert_eq!(kpi.elapsed_seconds, 3_600.0);
        assert!(kpi.rate_per_second > 0.0);
        assert!(kpi.lifetime_earnings > 1_000.0);
        assert!(s.state().money >= 0.0);
    }

    #[test]
    fn headless_run_reaches_second_level_and_keeps_invariants() {
        let mut s = Session::new_game(small_campaign(), quiet(), None).unwrap();
        run_headless(&mut s, 200.0, 0.5).unwrap();
        let st = s.state();
        assert_eq!(st.current_level_id, "l2");
        assert!(st.unlocked_levels.contains(&st.current_level_id));
        assert_eq!(st.prestiges, 0);
        assert!(st.money >= 0.0);
    }
}
