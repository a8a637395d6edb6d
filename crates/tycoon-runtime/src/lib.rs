#![deny(warnings)]

//! Game session runtime: owns the run state and serializes every mutation
//! (ticks, purchases, level transitions, prestige, saves) through `&mut self`.

use persistence::{PersistenceError, SaveSlot, Settings};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use tycoon_core::{validate_state, Campaign, CoreError, GameState, ItemCatalog, ValidationError};
use tycoon_econ::{prestige, production, EconError};

pub mod autoplay;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid game state: {0}")]
    Invalid(#[from] ValidationError),
    #[error("level goal not reached: {money:.2} of {goal:.2}")]
    GoalNotReached { goal: f64, money: f64 },
}

/// How a session was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Start {
    New,
    Resumed,
}

/// Result of checking the current level's goal.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelOffer {
    /// Goal not met yet.
    NotReached { goal: f64, money: f64 },
    /// Goal met; the player may advance to `next_id` or stay.
    Advance { next_id: String, next_name: String },
    /// Goal met on the last level; nothing to advance to.
    CampaignComplete,
}

/// Point-in-time KPIs for display and headless reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpi {
    pub level_id: String,
    pub level_name: String,
    pub money: f64,
    pub rate_per_second: f64,
    pub lifetime_earnings: f64,
    pub goal_money: f64,
    pub goal_progress: f64,
    pub prestiges: u32,
    pub prestige_credits: u32,
    pub prestige_multiplier: f64,
    pub credits_available: u32,
    pub next_prestige_target: f64,
    pub remaining_to_target: f64,
    pub elapsed_seconds: f64,
}

/// The single logical actor owning a game in progress.
pub struct Session {
    campaign: Campaign,
    state: GameState,
    catalog: ItemCatalog,
    settings: Settings,
    slot: Option<SaveSlot>,
    last_sample: Instant,
    autosave_timer: f64,
    autosaves: u32,
    elapsed: f64,
}

impl Session {
    /// Wrap an existing state, checking it against the campaign first.
    pub fn new(
        campaign: Campaign,
        state: GameState,
        settings: Settings,
        slot: Option<SaveSlot>,
    ) -> Result<Self, RuntimeError> {
        validate_state(&state, &campaign)?;
        let catalog = campaign.catalog_for(&state)?;
        Ok(Self {
            campaign,
            state,
            catalog,
            settings,
            slot,
            last_sample: Instant::now(),
            autosave_timer: 0.0,
            autosaves: 0,
            elapsed: 0.0,
        })
    }

    pub fn new_game(
        campaign: Campaign,
        settings: Settings,
        slot: Option<SaveSlot>,
    ) -> Result<Self, RuntimeError> {
        let state = campaign.new_game();
        Self::new(campaign, state, settings, slot)
    }

    /// Continue the saved game in `slot`, or start a new one when there is no
    /// usable save.
    pub fn resume_or_new(
        campaign: Campaign,
        settings: Settings,
        slot: SaveSlot,
    ) -> Result<(Self, Start), RuntimeError> {
        if let Some(state) = slot.try_load() {
            match validate_state(&state, &campaign) {
                Ok(()) => {
                    info!(path = %slot.path().display(), "resuming saved game");
                    let session = Self::new(campaign, state, settings, Some(slot))?;
                    return Ok((session, Start::Resumed));
                }
                Err(e) => warn!(error = %e, "saved game does not fit the campaign; starting over"),
            }
        }
        let session = Self::new_game(campaign, settings, Some(slot))?;
        Ok((session, Start::New))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_autosave_seconds(&mut self, seconds: u32) {
        self.settings.autosave_seconds = seconds;
        self.autosave_timer = 0.0;
    }

    pub fn autosaves(&self) -> u32 {
        self.autosaves
    }

    pub fn rate(&self) -> f64 {
        production::total_production_per_second(&self.state, &self.catalog)
    }

    /// Sample the wall clock and simulate the time since the previous sample.
    pub fn pump(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_sample).as_secs_f64();
        self.last_sample = now;
        self.advance(dt)
    }

    /// Forget time spent outside the loop (dialogs, level transitions).
    pub fn reset_clock(&mut self) {
        self.last_sample = Instant::now();
    }

    /// Simulate `dt` seconds. Returns the money produced.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if !(dt.is_finite() && dt > 0.0) {
            return 0.0;
        }
        let produced = production::tick(&mut self.state, &self.catalog, dt);
        self.elapsed += dt;
        self.autosave_timer += dt;
        let interval = self.settings.autosave_seconds;
        if interval > 0 && self.autosave_timer >= f64::from(interval) {
            self.autosave_timer = 0.0;
            if self.slot.is_some() {
                match self.save() {
                    Ok(()) => self.autosaves += 1,
                    Err(e) => warn!(error = %e, "autosave failed"),
                }
            }
        }
        produced
    }

    pub fn collect(&mut self) -> f64 {
        production::collect(&mut self.state)
    }

    pub fn buy(&mut self, id: &str) -> Result<f64, RuntimeError> {
        Ok(tycoon_econ::buy_item(&mut self.state, &self.catalog, id)?)
    }

    pub fn upgrade(&mut self, id: &str) -> Result<f64, RuntimeError> {
        Ok(tycoon_econ::buy_upgrade(&mut self.state, &self.catalog, id)?)
    }

    /// Evaluate the current level goal. Called on explicit player request; the
    /// answer stays the same for as long as money stays at or above the goal.
    pub fn level_offer(&self) -> Result<LevelOffer, RuntimeError> {
        let level = self.campaign.current(&self.state)?;
        if self.state.money < level.goal_money {
            return Ok(LevelOffer::NotReached {
                goal: level.goal_money,
                money: self.state.money,
            });
        }
        Ok(match self.campaign.next(&self.state)? {
            Some(next) => LevelOffer::Advance {
                next_id: next.id.clone(),
                next_name: next.name.clone(),
            },
            None => LevelOffer::CampaignComplete,
        })
    }

    /// Accept the advance offer. Returns the id of the level entered, or
    /// `None` on the last level.
    pub fn advance_level(&mut self) -> Result<Option<String>, RuntimeError> {
        let goal = self.campaign.current(&self.state)?.goal_money;
        if self.state.money < goal {
            return Err(RuntimeError::GoalNotReached {
                goal,
                money: self.state.money,
            });
        }
        let entered = self
            .campaign
            .progress_to_next_level(&mut self.state)?
            .map(|l| l.id.clone());
        if entered.is_some() {
            self.reload_catalog()?;
            self.reset_clock();
            self.save_if_attached();
        }
        Ok(entered)
    }

    /// Credits a prestige would award right now.
    pub fn prestige_available(&self) -> u32 {
        prestige::credits_earned_now(&self.state)
    }

    /// Prestige if any credits are available. Returns the credits earned.
    pub fn prestige(&mut self) -> Result<u32, RuntimeError> {
        let earned = prestige::apply_reset(&mut self.state, &self.campaign);
        if earned > 0 {
            self.reload_catalog()?;
            self.reset_clock();
            self.save_if_attached();
        }
        Ok(earned)
    }

    /// Write the state to the attached save slot (no-op without one).
    pub fn save(&self) -> Result<(), RuntimeError> {
        if let Some(slot) = &self.slot {
            slot.save(&self.state)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Kpi, RuntimeError> {
        let level = self.campaign.current(&self.state)?;
        Ok(Kpi {
            level_id: level.id.clone(),
            level_name: level.name.clone(),
            money: self.state.money,
            rate_per_second: self.rate(),
            lifetime_earnings: self.state.lifetime_earnings,
            goal_money: level.goal_money,
            goal_progress: self.campaign.goal_progress(&self.state)?,
            prestiges: self.state.prestiges,
            prestige_credits: self.state.prestige_credits,
            prestige_multiplier: prestige::prod_multiplier(self.state.prestige_credits),
            credits_available: prestige::credits_earned_now(&self.state),
            next_prestige_target: prestige::next_target(&self.state),
            remaining_to_target: prestige::remaining_to_next_target(&self.state),
            elapsed_seconds: self.elapsed,
        })
    }

    fn reload_catalog(&mut self) -> Result<(), RuntimeError> {
        self.catalog = self.campaign.catalog_for(&self.state)?;
        Ok(())
    }

    fn save_if_attached(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "save after transition failed");
        }
    }
}
