//! Encounter state.
//!
//! Combatants are lightweight per-encounter projections of character records;
//! the active-combat snapshot that owns them is replaced wholesale each turn
//! so resolution stays pure and replayable.

use crate::dice::{roll_damage, DiceRoller, RollError};
use crate::world::{Character, CharacterId, ConsumableEffect, Item, LocationId, StatusEffect};
use serde::{Deserialize, Serialize};

/// Which side a combatant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

/// A per-encounter projection of a character's combat-relevant state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub character_id: CharacterId,
    pub name: String,
    pub team: Team,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: Option<i32>,
    pub max_mp: Option<i32>,
    pub statuses: Vec<StatusEffect>,
    pub defeated: bool,
    /// A lootable item that keeps a won encounter open until claimed.
    pub reward: Option<Item>,
}

impl Combatant {
    /// Project a character record into an encounter.
    pub fn from_character(character: &Character, team: Team) -> Self {
        Self {
            character_id: character.id,
            name: character.name.clone(),
            team,
            hp: character.hp,
            max_hp: character.max_hp,
            mp: character.mp,
            max_mp: character.max_mp,
            statuses: character.statuses.clone(),
            defeated: character.defeated || character.hp <= 0,
            reward: character.reward.clone(),
        }
    }

    /// An entry for the player, whose maximums come from derived stats.
    pub fn player_entry(
        character_id: CharacterId,
        name: impl Into<String>,
        hp: i32,
        max_hp: i32,
        mp: i32,
        max_mp: i32,
    ) -> Self {
        Self {
            character_id,
            name: name.into(),
            team: Team::Player,
            hp,
            max_hp,
            mp: Some(mp),
            max_mp: Some(max_mp),
            statuses: Vec::new(),
            defeated: hp <= 0,
            reward: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.defeated
    }

    /// Subtract damage, flooring hit points at zero.
    /// Returns true when this blow defeated the combatant.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 && !self.defeated {
            self.defeated = true;
            return true;
        }
        false
    }

    /// Restore hit points up to the maximum. A defeated combatant brought
    /// above zero is back in the fight.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        if self.hp > 0 {
            self.defeated = false;
        }
        self.hp - old
    }
}

/// Logical state of an encounter, derived from the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    Inactive,
    Active,
    /// All enemies down, rewards settled.
    Victory,
    /// All player-side combatants down.
    Defeat,
    /// All enemies down, but a defeated enemy still carries an unclaimed
    /// reward; the encounter stays open until it is claimed.
    VictoryPendingReward,
}

/// The live encounter snapshot. Exactly one may exist per session; each turn
/// replaces it rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCombat {
    pub combatants: Vec<Combatant>,
    pub is_active: bool,
    pub environment: String,
    pub contested_location: Option<LocationId>,
}

impl ActiveCombat {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            combatants: Vec::new(),
            is_active: true,
            environment: environment.into(),
            contested_location: None,
        }
    }

    pub fn with_contested_location(mut self, location: LocationId) -> Self {
        self.contested_location = Some(location);
        self
    }

    pub fn with_combatant(mut self, combatant: Combatant) -> Self {
        self.combatants.push(combatant);
        self
    }

    pub fn combatant(&self, id: CharacterId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.character_id == id)
    }

    pub fn combatant_mut(&mut self, id: CharacterId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.character_id == id)
    }

    pub fn team(&self, team: Team) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(move |c| c.team == team)
    }

    pub fn living(&self, team: Team) -> impl Iterator<Item = &Combatant> {
        self.team(team).filter(|c| c.is_alive())
    }

    pub fn all_defeated(&self, team: Team) -> bool {
        self.team(team).all(|c| c.defeated)
    }

    /// A defeated enemy still carrying an unclaimed reward?
    pub fn has_pending_reward(&self) -> bool {
        self.combatants
            .iter()
            .any(|c| c.team == Team::Enemy && c.defeated && c.reward.is_some())
    }

    pub fn phase(&self) -> CombatPhase {
        if self.combatants.is_empty() {
            return CombatPhase::Inactive;
        }
        if self.all_defeated(Team::Enemy) {
            if self.has_pending_reward() {
                return CombatPhase::VictoryPendingReward;
            }
            return CombatPhase::Victory;
        }
        if self.all_defeated(Team::Player) {
            return CombatPhase::Defeat;
        }
        if self.is_active {
            CombatPhase::Active
        } else {
            CombatPhase::Inactive
        }
    }
}

/// Who a one-off consumable effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumableTarget {
    Combatant(CharacterId),
    AllEnemies,
}

/// Apply a consumable effect to the encounter, outside the per-turn flow.
///
/// Amounts go through the damage evaluator, so malformed notations degrade to
/// 1 rather than failing. Returns log lines describing what happened.
pub fn apply_consumable(
    combat: &mut ActiveCombat,
    target: ConsumableTarget,
    effect: &ConsumableEffect,
    roller: &mut dyn DiceRoller,
) -> Result<Vec<String>, RollError> {
    let ids: Vec<CharacterId> = match target {
        ConsumableTarget::Combatant(id) => {
            combat.combatant(id).map(|c| c.character_id).into_iter().collect()
        }
        ConsumableTarget::AllEnemies => combat
            .living(Team::Enemy)
            .map(|c| c.character_id)
            .collect(),
    };

    let mut log = Vec::new();
    for id in ids {
        let amount = match effect {
            ConsumableEffect::Heal { dice } => roll_damage(dice, roller)?,
            ConsumableEffect::Harm { dice } => roll_damage(dice, roller)?,
            ConsumableEffect::RestoreMana { amount } => *amount,
        };
        let Some(combatant) = combat.combatant_mut(id) else {
            continue;
        };
        match effect {
            ConsumableEffect::Heal { .. } => {
                let healed = combatant.heal(amount);
                log.push(format!("{} recovers {} HP.", combatant.name, healed));
            }
            ConsumableEffect::Harm { .. } => {
                let downed = combatant.apply_damage(amount);
                log.push(format!("{} takes {} damage.", combatant.name, amount));
                if downed {
                    log.push(format!("{} is defeated!", combatant.name));
                }
            }
            ConsumableEffect::RestoreMana { .. } => {
                if let (Some(mp), Some(max_mp)) = (combatant.mp, combatant.max_mp) {
                    combatant.mp = Some((mp + amount).min(max_mp));
                    log.push(format!("{} recovers {} MP.", combatant.name, amount));
                }
            }
        }
    }
    Ok(log)
}
