//! CombatSession - the primary public API.
//!
//! Wraps the derivation engine, resolver, reward engine, and propagator into
//! a single facade. Resolution itself is pure; this session owns the one
//! mutable slot holding "current" state (world, active combat, pre-combat
//! snapshot) and serializes every turn on the calling thread.

use crate::combat::{
    apply_consumable, ActiveCombat, CombatPhase, Combatant, ConsumableTarget, Team,
};
use crate::dice::{DiceRoller, RngRoller, RollError};
use crate::propagator::{apply_update, ConquestHandler, Notification, NullConquestHandler};
use crate::repository::{
    FamiliarRepository, InMemoryFamiliars, InMemoryInventory, InventoryRepository,
};
use crate::resolver::{claim_reward, resolve_turn, CombatUpdate};
use crate::reward::RewardSnapshot;
use crate::stats::{derive_stats, EffectiveStats};
use crate::world::{Character, CharacterId, GameWorld, Item, LocationId};
use thiserror::Error;

/// Errors from session operations.
///
/// Sequencing mistakes are typed errors here so the UI layer can be defensive
/// without crashing the session; the resolver itself never checks them.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No encounter is active")]
    NoActiveCombat,

    #[error("The encounter is already over")]
    CombatAlreadyOver,

    #[error("An encounter is already in progress")]
    EncounterInProgress,

    #[error("Encounter mode is disabled")]
    RpgModeDisabled,

    #[error("Dice error: {0}")]
    Roll(#[from] RollError),
}

/// Configuration for creating a new combat session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Player name.
    pub player_name: String,

    /// Whether encounter (RPG) mode is active.
    pub rpg_mode: bool,

    /// Environment description used when an encounter does not supply one.
    pub default_environment: String,
}

impl SessionConfig {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            rpg_mode: true,
            default_environment: "An open field".to_string(),
        }
    }

    pub fn with_rpg_mode(mut self, rpg_mode: bool) -> Self {
        self.rpg_mode = rpg_mode;
        self
    }

    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = environment.into();
        self
    }
}

/// What one resolved turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub update: CombatUpdate,
    pub notifications: Vec<Notification>,
}

/// A combat session over one world.
pub struct CombatSession {
    world: GameWorld,
    familiars: Box<dyn FamiliarRepository>,
    inventory: Box<dyn InventoryRepository>,
    conquests: Box<dyn ConquestHandler>,
    roller: Box<dyn DiceRoller>,
    snapshot: Option<RewardSnapshot>,
    config: SessionConfig,
}

impl CombatSession {
    /// Create a session with in-memory repositories and an entropy-seeded
    /// roller. The player starts at full derived HP/MP.
    pub fn new(config: SessionConfig) -> Self {
        let mut world = GameWorld::new(config.player_name.clone());
        world.rpg_mode = config.rpg_mode;
        let mut session = Self {
            world,
            familiars: Box::new(InMemoryFamiliars::new()),
            inventory: Box::new(InMemoryInventory::new()),
            conquests: Box::new(NullConquestHandler),
            roller: Box::new(RngRoller::default()),
            snapshot: None,
            config,
        };
        let stats = session.effective_stats();
        session.world.player.hp = stats.max_hp;
        session.world.player.mp = stats.max_mp;
        session
    }

    /// Replace the world (existing campaigns, loaded saves).
    pub fn with_world(mut self, world: GameWorld) -> Self {
        self.world = world;
        self
    }

    pub fn with_roller(mut self, roller: Box<dyn DiceRoller>) -> Self {
        self.roller = roller;
        self
    }

    pub fn with_familiars(mut self, familiars: Box<dyn FamiliarRepository>) -> Self {
        self.familiars = familiars;
        self
    }

    pub fn with_inventory(mut self, inventory: Box<dyn InventoryRepository>) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_conquest_handler(mut self, conquests: Box<dyn ConquestHandler>) -> Self {
        self.conquests = conquests;
        self
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    pub fn inventory(&self) -> &dyn InventoryRepository {
        self.inventory.as_ref()
    }

    pub fn familiars(&self) -> &dyn FamiliarRepository {
        self.familiars.as_ref()
    }

    /// Current derived stats for the player, including the active familiar's
    /// passive bonus. Recomputed on demand, never cached.
    pub fn effective_stats(&self) -> EffectiveStats {
        let familiar_bonus = self
            .world
            .player
            .active_familiar
            .and_then(|id| self.familiars.load(id))
            .and_then(|familiar| familiar.bonus);
        derive_stats(
            &self.world.player.attributes,
            &self.world.player.equipment,
            familiar_bonus.as_ref(),
            self.world.rpg_mode,
        )
    }

    /// Begin an encounter against the given enemies.
    ///
    /// Enemy records are adopted into the world so resolution can read their
    /// stored combat fields; the pre-combat reward snapshot is captured here.
    pub fn start_encounter(
        &mut self,
        enemies: Vec<Character>,
        environment: Option<String>,
        contested_location: Option<LocationId>,
    ) -> Result<&ActiveCombat, SessionError> {
        if !self.world.rpg_mode {
            return Err(SessionError::RpgModeDisabled);
        }
        if self.world.combat.is_some() {
            return Err(SessionError::EncounterInProgress);
        }

        let stats = self.effective_stats();
        let player = &self.world.player;
        let mut combat = ActiveCombat::new(
            environment.unwrap_or_else(|| self.config.default_environment.clone()),
        )
        .with_combatant(Combatant::player_entry(
            player.id,
            player.name.clone(),
            player.hp.min(stats.max_hp),
            stats.max_hp,
            player.mp.min(stats.max_mp),
            stats.max_mp,
        ));
        combat.contested_location = contested_location;

        for enemy in enemies {
            combat
                .combatants
                .push(Combatant::from_character(&enemy, Team::Enemy));
            match self.world.character_mut(enemy.id) {
                Some(existing) => *existing = enemy,
                None => {
                    self.world.characters.push(enemy);
                }
            }
        }

        self.snapshot = Some(RewardSnapshot::capture(&combat, &self.world));
        self.world.combat = Some(combat);
        Ok(self.world.combat.as_ref().expect("combat just stored"))
    }

    /// Resolve one full turn and fold the result back into the world.
    pub fn play_turn(&mut self) -> Result<TurnOutcome, SessionError> {
        let combat = self
            .world
            .combat
            .clone()
            .ok_or(SessionError::NoActiveCombat)?;
        match combat.phase() {
            CombatPhase::Victory | CombatPhase::Defeat | CombatPhase::Inactive => {
                return Err(SessionError::CombatAlreadyOver)
            }
            CombatPhase::Active | CombatPhase::VictoryPendingReward => {}
        }

        let stats = self.effective_stats();
        let snapshot = self.snapshot.clone().unwrap_or_default();
        let update = resolve_turn(
            &self.world,
            &combat,
            &stats,
            &snapshot,
            self.roller.as_mut(),
        )?;
        let notifications = apply_update(
            &mut self.world,
            &update,
            self.familiars.as_mut(),
            self.conquests.as_mut(),
        );
        if update.combat_ended {
            self.snapshot = None;
        }
        Ok(TurnOutcome {
            update,
            notifications,
        })
    }

    /// Claim a pending hunt reward from a defeated combatant.
    ///
    /// On success the item lands in the backpack and, once no rewards remain
    /// unclaimed, the encounter fully ends. An invalid claim is a quiet no-op.
    pub fn claim_hunt_reward(
        &mut self,
        combatant_id: CharacterId,
    ) -> Result<Option<Item>, SessionError> {
        let combat = self
            .world
            .combat
            .as_ref()
            .ok_or(SessionError::NoActiveCombat)?;
        let Some((item, next)) = claim_reward(combat, combatant_id) else {
            return Ok(None);
        };

        self.inventory.add_item(item.clone());
        if let Some(character) = self.world.character_mut(combatant_id) {
            character.reward = None;
        }
        if next.is_active {
            self.world.combat = Some(next);
        } else {
            self.world.combat = None;
            self.snapshot = None;
        }
        Ok(Some(item))
    }

    /// Use a named consumable from the backpack on a combatant or on all
    /// enemies, outside the per-turn flow. Returns the effect log.
    pub fn use_consumable_item(
        &mut self,
        name: &str,
        target: ConsumableTarget,
    ) -> Result<Vec<String>, SessionError> {
        let mut combat = self
            .world
            .combat
            .clone()
            .ok_or(SessionError::NoActiveCombat)?;

        let mut inventory = self.inventory.load();
        let Some(item) = inventory.find_item(name) else {
            return Ok(vec![format!("There is no {name} in the pack.")]);
        };
        let Some(effect) = item.consumable.clone() else {
            return Ok(vec![format!("{} cannot be consumed.", item.name)]);
        };
        let id = item.id;

        let log = apply_consumable(&mut combat, target, &effect, self.roller.as_mut())?;
        inventory.remove_item(id);
        self.inventory.save(inventory);
        self.world.combat = Some(combat);
        Ok(log)
    }

    /// Abandon the current encounter, discarding its snapshot.
    ///
    /// This is the narrative collaborator's termination request; it performs
    /// no reward or write-back work.
    pub fn end_encounter(&mut self) -> Option<ActiveCombat> {
        self.snapshot = None;
        self.world.combat.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        sample_goblin, sample_hunt_target, sample_world, RecordingConquests, ScriptedRoller,
    };
    use crate::world::{Attribute, BonusKind, Faction, Familiar, Location};

    fn scripted_session(rolls: impl IntoIterator<Item = u32>) -> CombatSession {
        CombatSession::new(SessionConfig::new("Aveline"))
            .with_world(sample_world())
            .with_roller(Box::new(ScriptedRoller::new(rolls)))
    }

    #[test]
    fn test_full_victory_flow() {
        // Shortsword + STR 14: damage 1d6+2 vs the goblin's 7 HP.
        // Turn: d20 = 15 (hit vs AC 12), d6 = 5 (7 damage, defeated),
        // then one d5 draw pays out currency.
        let mut session = scripted_session([15, 5, 3]);
        session
            .start_encounter(vec![sample_goblin()], None, None)
            .unwrap();

        let outcome = session.play_turn().unwrap();
        assert!(outcome.update.combat_ended);
        assert_eq!(outcome.update.phase, CombatPhase::Victory);
        assert_eq!(outcome.update.experience, 10);
        assert_eq!(outcome.update.currency, 3);
        assert!(outcome.update.log.contains("Victoire!"));

        // Propagated onto the long-lived records
        assert_eq!(session.world().player.experience, 10);
        assert_eq!(session.world().player.currency, 3);
        assert!(session.world().combat.is_none());
        let goblin = &session.world().characters[0];
        assert_eq!(goblin.hp, 0);
        assert!(goblin.defeated);
    }

    #[test]
    fn test_sequencing_errors() {
        let mut session = scripted_session([]);
        assert!(matches!(
            session.play_turn(),
            Err(SessionError::NoActiveCombat)
        ));

        session
            .start_encounter(vec![sample_goblin()], None, None)
            .unwrap();
        assert!(matches!(
            session.start_encounter(vec![sample_goblin()], None, None),
            Err(SessionError::EncounterInProgress)
        ));
    }

    #[test]
    fn test_rpg_mode_disabled_blocks_encounters() {
        let mut session =
            CombatSession::new(SessionConfig::new("Aveline").with_rpg_mode(false));
        assert!(matches!(
            session.start_encounter(vec![sample_goblin()], None, None),
            Err(SessionError::RpgModeDisabled)
        ));
        assert_eq!(session.effective_stats(), EffectiveStats::neutral());
    }

    #[test]
    fn test_hunt_claim_flow() {
        // Turn 1: d20 = 15 (hit vs AC 11), d6 = 4 (6 damage, boar at 6);
        // boar d20 = 3 (miss vs AC 24).
        // Turn 2: d20 = 15, d6 = 6 (8 damage, boar down, reward pending).
        let mut session = scripted_session([15, 4, 3, 15, 6]);
        session
            .start_encounter(vec![sample_hunt_target()], Some("deep woods".into()), None)
            .unwrap();
        let boar_id = session.world().combat.as_ref().unwrap().combatants[1].character_id;

        session.play_turn().unwrap();
        let outcome = session.play_turn().unwrap();
        assert!(!outcome.update.combat_ended);
        assert_eq!(outcome.update.phase, CombatPhase::VictoryPendingReward);
        assert_eq!(outcome.update.experience, 0);
        assert!(session.world().combat.is_some());

        // An invalid claim changes nothing
        assert!(session.claim_hunt_reward(CharacterId::new()).unwrap().is_none());
        assert!(session.world().combat.is_some());

        // The real claim hands over the trophy and ends the encounter
        let item = session.claim_hunt_reward(boar_id).unwrap().unwrap();
        assert_eq!(item.name, "Boar-Tusk Charm");
        assert!(session.inventory().load().has_item("Boar-Tusk Charm"));
        assert!(session.world().combat.is_none());
    }

    #[test]
    fn test_conquest_flow() {
        let mut session = scripted_session([15, 5, 3]);
        let location_id = session.world_mut().add_location(
            Location::new("Watchtower").with_controller(Faction::Rival("Bandits".into())),
        );
        session
            .start_encounter(vec![sample_goblin()], None, Some(location_id))
            .unwrap();

        let outcome = session.play_turn().unwrap();
        assert!(outcome.update.combat_ended);
        assert!(outcome
            .notifications
            .iter()
            .any(|n| matches!(n, Notification::Conquest { location, .. } if *location == location_id)));
        assert_eq!(
            session.world().location(location_id).unwrap().controlled_by,
            Faction::Player
        );
    }

    #[test]
    fn test_familiar_bonus_and_experience() {
        let mut familiars = InMemoryFamiliars::new();
        let mut familiar = Familiar::new("Ember")
            .with_bonus(BonusKind::Attribute(Attribute::Strength), 2);
        familiar.experience = 90;
        let familiar_id = familiars.insert(familiar);

        let mut session = scripted_session([15, 5, 3]).with_familiars(Box::new(familiars));
        session.world_mut().player.active_familiar = Some(familiar_id);

        // +2 STR lifts the modifier: damage becomes 1d6+3
        assert_eq!(session.effective_stats().damage, "1d6+3");

        session
            .start_encounter(vec![sample_goblin()], None, None)
            .unwrap();
        let outcome = session.play_turn().unwrap();
        assert!(outcome.update.combat_ended);

        // 10 XP pushes the familiar from 90/100 over its threshold
        assert!(matches!(
            outcome.notifications.as_slice(),
            [Notification::FamiliarLevelUp { new_level: 2, .. }]
        ));
        let saved = session.familiars().load(familiar_id).unwrap();
        assert_eq!(saved.level, 2);
        assert_eq!(saved.experience, 0);
        assert_eq!(saved.experience_threshold, 150);
    }

    #[test]
    fn test_use_consumable_item() {
        // One whiffed turn (player d20 = 2, goblin d20 = 2), then a
        // Healing Draught: 2d4+2 rolling 4+4.
        let mut session = scripted_session([2, 2, 4, 4]);
        session.inventory.add_item(
            crate::items::get_consumable("Healing Draught").unwrap(),
        );
        session
            .start_encounter(vec![sample_goblin()], None, None)
            .unwrap();
        let player_id = session.world().player.id;

        // Hurt the player directly in the snapshot to have something to heal
        session
            .world_mut()
            .combat
            .as_mut()
            .unwrap()
            .combatant_mut(player_id)
            .unwrap()
            .hp = 20;

        session.play_turn().unwrap();
        let log = session
            .use_consumable_item("Healing Draught", ConsumableTarget::Combatant(player_id))
            .unwrap();
        assert!(log[0].contains("recovers 10 HP"));
        assert!(!session.inventory().load().has_item("Healing Draught"));
        assert_eq!(
            session
                .world()
                .combat
                .as_ref()
                .unwrap()
                .combatant(player_id)
                .unwrap()
                .hp,
            30
        );
    }

    #[test]
    fn test_end_encounter_discards_combat() {
        let mut session = scripted_session([]);
        session
            .start_encounter(vec![sample_goblin()], None, None)
            .unwrap();
        assert!(session.end_encounter().is_some());
        assert!(session.world().combat.is_none());
        assert!(matches!(
            session.play_turn(),
            Err(SessionError::NoActiveCombat)
        ));
    }

    #[test]
    fn test_custom_conquest_handler_is_accepted() {
        let mut session = scripted_session([15, 5, 3])
            .with_conquest_handler(Box::new(RecordingConquests::new()));
        let location_id = session.world_mut().add_location(Location::new("Bridge"));
        session
            .start_encounter(vec![sample_goblin()], None, Some(location_id))
            .unwrap();
        let outcome = session.play_turn().unwrap();
        assert_eq!(outcome.update.conquered_location, Some(location_id));
    }
}
