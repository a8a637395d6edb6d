//! Campaign level table and the forward-only level state machine.

use crate::{validate_levels, CoreError, GameState, ItemCatalog, LevelDef, ValidationError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

const BUILTIN_CAMPAIGN: &str = include_str!("../../../assets/campaign.yaml");

#[derive(Deserialize)]
struct CampaignFile {
    levels: Vec<LevelDef>,
}

/// Fixed, validated, non-empty sequence of levels.
#[derive(Clone, Debug, PartialEq)]
pub struct Campaign {
    levels: Vec<LevelDef>,
}

impl Campaign {
    pub fn new(levels: Vec<LevelDef>) -> Result<Self, ValidationError> {
        validate_levels(&levels)?;
        Ok(Self { levels })
    }

    /// The six-level campaign shipped with the game.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_yaml_str(BUILTIN_CAMPAIGN)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CoreError> {
        let file: CampaignFile = serde_yaml::from_str(text)?;
        Ok(Self::new(file.levels)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    pub fn first(&self) -> &LevelDef {
        // Non-empty by construction.
        &self.levels[0]
    }

    pub fn level(&self, id: &str) -> Result<&LevelDef, CoreError> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| CoreError::LevelNotFound(id.to_string()))
    }

    /// A brand new game on the first level. Nothing is owned yet.
    pub fn new_game(&self) -> GameState {
        GameState::starting_at(self.first().id.clone())
    }

    /// Level the state is currently playing.
    pub fn current(&self, state: &GameState) -> Result<&LevelDef, CoreError> {
        self.level(&state.current_level_id)
    }

    /// Level after the current one, `None` on the last level.
    pub fn next(&self, state: &GameState) -> Result<Option<&LevelDef>, CoreError> {
        let idx = self.index_of(&state.current_level_id)?;
        Ok(self.levels.get(idx + 1))
    }

    pub fn is_last(&self, state: &GameState) -> Result<bool, CoreError> {
        Ok(self.next(state)?.is_none())
    }

    /// Producer catalog of the current level.
    pub fn catalog_for(&self, state: &GameState) -> Result<ItemCatalog, CoreError> {
        Ok(ItemCatalog::for_level(self.current(state)?)?)
    }

    /// Whether the current level's money goal is met. Re-evaluated on every
    /// call; nothing is latched.
    pub fn goal_reached(&self, state: &GameState) -> Result<bool, CoreError> {
        Ok(state.money >= self.current(state)?.goal_money)
    }

    /// Fraction of the current goal reached, clamped to [0, 1].
    pub fn goal_progress(&self, state: &GameState) -> Result<f64, CoreError> {
        let goal = self.current(state)?.goal_money;
        Ok((state.money / goal).clamp(0.0, 1.0))
    }

    /// Advance to the next level, wiping the run and seeding one unit of the
    /// new level's first producer. Returns the level entered, or `None` when
    /// already on the last level (state untouched).
    pub fn progress_to_next_level(
        &self,
        state: &mut GameState,
    ) -> Result<Option<&LevelDef>, CoreError> {
        let next = match self.next(state)? {
            Some(next) => next,
            None => return Ok(None),
        };
        state.unlocked_levels.insert(next.id.clone());
        state.current_level_id = next.id.clone();
        state.clear_run();
        seed_first_producer(state, next);
        info!(level = %next.id, "advanced to next level");
        Ok(Some(next))
    }

    /// Return to the first level with only it unlocked, wiping the run and
    /// seeding one unit of its first producer.
    pub fn reset_to_first_level(&self, state: &mut GameState) -> &LevelDef {
        let first = self.first();
        state.current_level_id = first.id.clone();
        state.unlocked_levels.clear();
        state.unlocked_levels.insert(first.id.clone());
        state.clear_run();
        seed_first_producer(state, first);
        first
    }

    fn index_of(&self, id: &str) -> Result<usize, CoreError> {
        self.levels
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::LevelNotFound(id.to_string()))
    }
}

fn seed_first_producer(state: &mut GameState, level: &LevelDef) {
    if let Some(first) = level.producers.first() {
        state.item_state_mut(&first.id).quantity = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemDef;

    fn level(id: &str, goal: f64, producers: &[&str]) -> LevelDef {
        LevelDef {
            id: id.to_string(),
            name: format!("Level {id}"),
            goal_money: goal,
            producers: producers
                .iter()
                .map(|p| ItemDef::new(*p, *p, 10.0, 1.15, 1.0))
                .collect(),
        }
    }

    fn two_levels() -> Campaign {
        Campaign::new(vec![
            level("l1", 100.0, &["a", "b"]),
            level("l2", 1000.0, &["c", "d"]),
        ])
        .unwrap()
    }

    #[test]
    fn builtin_campaign_parses() {
        let c = Campaign::builtin().unwrap();
        assert_eq!(c.levels().len(), 6);
        assert_eq!(c.first().id, "lvl1");
        assert_eq!(c.first().goal_money, 1_000_000.0);
        assert_eq!(c.first().producers[0].id, "vaporator");
        assert_eq!(c.levels()[5].goal_money, 120_000_000_000_000.0);
        assert!(c.levels().iter().all(|l| l.producers.len() == 5));
    }

    #[test]
    fn yaml_with_duplicate_levels_is_rejected() {
        let text = "levels:\n  - { id: a, name: A, goal_money: 1, producers: [] }\n  - { id: a, name: B, goal_money: 2, producers: [] }\n";
        assert_eq!(
            Campaign::from_yaml_str(text),
            Err(CoreError::Invalid(ValidationError::DuplicateLevel("a".into())))
        );
        assert!(matches!(
            Campaign::from_yaml_str("levels: nope"),
            Err(CoreError::Parse(_))
        ));
    }

    #[test]
    fn current_and_next() {
        let c = two_levels();
        let mut s = c.new_game();
        assert_eq!(c.current(&s).unwrap().id, "l1");
        assert_eq!(c.next(&s).unwrap().unwrap().id, "l2");
        s.current_level_id = "l2".into();
        s.unlocked_levels.insert("l2".into());
        assert!(c.next(&s).unwrap().is_none());
        assert!(c.is_last(&s).unwrap());
    }

    #[test]
    fn unknown_current_level_is_integrity_error() {
        let c = two_levels();
        let mut s = c.new_game();
        s.current_level_id = "ghost".into();
        assert_eq!(c.current(&s), Err(CoreError::LevelNotFound("ghost".into())));
        assert!(c.next(&s).is_err());
    }

    #[test]
    fn progress_resets_run_and_seeds_first_producer() {
        let c = two_levels();
        let mut s = c.new_game();
        s.money = 150.0;
        s.lifetime_earnings = 500.0;
        s.prestige_credits = 2;
        let st = s.item_state_mut("b");
        st.quantity = 4;
        st.upgrade_level = 3;

        let entered = c.progress_to_next_level(&mut s).unwrap().unwrap();
        assert_eq!(entered.id, "l2");
        assert_eq!(s.current_level_id, "l2");
        assert!(s.unlocked_levels.contains("l1") && s.unlocked_levels.contains("l2"));
        assert_eq!(s.money, 0.0);
        assert_eq!(s.lifetime_earnings, 500.0);
        assert_eq!(s.prestige_credits, 2);
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.quantity_of("c"), 1);
        assert_eq!(s.upgrade_level_of("c"), 0);
        assert_eq!(s.quantity_of("b"), 0);
    }

    #[test]
    fn progress_on_last_level_is_noop() {
        let c = two_levels();
        let mut s = c.new_game();
        c.progress_to_next_level(&mut s).unwrap();
        s.money = 5000.0;
        s.item_state_mut("d").quantity = 2;
        let before = s.clone();
        assert!(c.progress_to_next_level(&mut s).unwrap().is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn reset_to_first_level_mirrors_onboarding_seed() {
        let c = two_levels();
        let mut s = c.new_game();
        c.progress_to_next_level(&mut s).unwrap();
        s.money = 42.0;
        let first = c.reset_to_first_level(&mut s);
        assert_eq!(first.id, "l1");
        assert_eq!(s.current_level_id, "l1");
        assert_eq!(s.unlocked_levels.len(), 1);
        assert_eq!(s.money, 0.0);
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.quantity_of("a"), 1);
    }

    #[test]
    fn empty_producer_list_seeds_nothing() {
        let c = Campaign::new(vec![level("l1", 10.0, &["a"]), level("l2", 10.0, &[])]).unwrap();
        let mut s = c.new_game();
        c.progress_to_next_level(&mut s).unwrap();
        assert!(s.items.is_empty());
    }

    #[test]
    fn goal_is_level_triggered() {
        let c = two_levels();
        let mut s = c.new_game();
        s.money = 99.0;
        assert!(!c.goal_reached(&s).unwrap());
        assert!((c.goal_progress(&s).unwrap() - 0.99).abs() < 1e-12);
        s.money = 100.0;
        assert!(c.goal_reached(&s).unwrap());
        // Asking again without any change gives the same answer.
        assert!(c.goal_reached(&s).unwrap());
        s.money = 250.0;
        assert_eq!(c.goal_progress(&s).unwrap(), 1.0);
    }

    #[test]
    fn catalog_tracks_current_level() {
        let c = two_levels();
        let mut s = c.new_game();
        let ids: Vec<_> = c.catalog_for(&s).unwrap().all().iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, ["a", "b"]);
        c.progress_to_next_level(&mut s).unwrap();
        assert!(c.catalog_for(&s).unwrap().get("c").is_some());
    }
}
