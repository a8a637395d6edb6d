//! Prestige credits: decade thresholds over lifetime earnings.
//!
//! Credit `n` (1-based) unlocks once lifetime earnings reach
//! `base * 10^(n-1)`. Lifetime earnings survive every reset, and the
//! historical high-water mark guarantees each decade pays out only once.

use tracing::info;
use tycoon_core::{Campaign, GameState};

/// Lifetime earnings needed for the first credit.
pub const BASE_THRESHOLD: f64 = 1_000_000.0;
/// Production bonus per credit held.
pub const CREDIT_BONUS: f64 = 0.05;

fn decade(base: f64, index: i64) -> f64 {
    let exp = i32::try_from(index).unwrap_or(if index < 0 { i32::MIN } else { i32::MAX });
    base * 10f64.powi(exp)
}

/// Number of credits lifetime earnings have unlocked in total:
/// `floor(log10(lifetime) - log10(base) + 1)` once `lifetime >= base`.
pub fn total_credits_unlocked(lifetime: f64, base: f64) -> u32 {
    if !(lifetime.is_finite() && base > 0.0) || lifetime < base {
        return 0;
    }
    let mut credits = ((lifetime.log10() - base.log10()).floor() as i64 + 1).max(1);
    // Pin exact decade boundaries that the log estimate may straddle.
    while credits > 1 && lifetime < decade(base, credits - 1) {
        credits -= 1;
    }
    while lifetime >= decade(base, credits) {
        credits += 1;
    }
    u32::try_from(credits).unwrap_or(u32::MAX)
}

/// Credits a reset would award now, given how many were already banked.
pub fn potential_credits(lifetime: f64, already_banked: u32, base: f64) -> u32 {
    total_credits_unlocked(lifetime, base).saturating_sub(already_banked)
}

/// Permanent production multiplier for the credits held.
pub fn prod_multiplier(credits: u32) -> f64 {
    1.0 + CREDIT_BONUS * f64::from(credits)
}

/// Next decade threshold above the current lifetime band.
pub fn next_credit_threshold_from_lifetime(lifetime: f64, base: f64) -> f64 {
    if lifetime < base {
        return base;
    }
    decade(base, i64::from(total_credits_unlocked(lifetime, base)))
}

/// Lifetime earnings at which a credit not yet banked becomes available.
pub fn next_new_credit_threshold(lifetime: f64, already_banked: u32, base: f64) -> f64 {
    if lifetime < base {
        return base;
    }
    let total = total_credits_unlocked(lifetime, base);
    decade(base, i64::from(already_banked.max(total)))
}

/// Lifetime earnings still missing before the next new credit (>= 0).
pub fn remaining_to_next_new_credit(lifetime: f64, already_banked: u32, base: f64) -> f64 {
    (next_new_credit_threshold(lifetime, already_banked, base) - lifetime).max(0.0)
}

/// Credits a reset would award for `state` right now.
pub fn credits_earned_now(state: &GameState) -> u32 {
    potential_credits(
        state.lifetime_earnings,
        state.prestige_credits_earned_historical,
        BASE_THRESHOLD,
    )
}

/// Next new-credit target for `state`.
pub fn next_target(state: &GameState) -> f64 {
    next_new_credit_threshold(
        state.lifetime_earnings,
        state.prestige_credits_earned_historical,
        BASE_THRESHOLD,
    )
}

/// Lifetime earnings `state` still needs for its next new credit.
pub fn remaining_to_next_target(state: &GameState) -> f64 {
    remaining_to_next_new_credit(
        state.lifetime_earnings,
        state.prestige_credits_earned_historical,
        BASE_THRESHOLD,
    )
}

/// Bank any newly unlocked credits and send the run back to the first level.
///
/// Safe to call speculatively: with nothing to bank it returns 0 and leaves
/// `state` untouched.
pub fn apply_reset(state: &mut GameState, campaign: &Campaign) -> u32 {
    let earned = credits_earned_now(state);
    if earned == 0 {
        return 0;
    }
    state.prestige_credits = state.prestige_credits.saturating_add(earned);
    state.prestige_credits_earned_historical =
        state.prestige_credits_earned_historical.saturating_add(earned);
    state.prestiges = state.prestiges.saturating_add(1);
    campaign.reset_to_first_level(state);
    info!(
        earned,
        credits = state.prestige_credits,
        prestiges = state.prestiges,
        "prestige reset"
    );
    earned
}
