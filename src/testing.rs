//! Testing utilities.
//!
//! A scripted dice roller for forcing exact outcomes, a recording conquest
//! handler, and sample builders for quickly assembling worlds and foes.

use crate::dice::{DiceRoller, RollError};
use crate::propagator::ConquestHandler;
use crate::world::{Attributes, BonusKind, Character, GameWorld, Item, LocationId};
use std::collections::VecDeque;

/// A roller that returns a fixed script of values and fails once it runs dry.
///
/// Scripts force outcomes regardless of the die size asked for, which keeps
/// forced-roll scenarios readable; exhaustion surfaces as a fatal
/// [`RollError`], the same contract a failing entropy source would have.
pub struct ScriptedRoller {
    rolls: VecDeque<u32>,
    consumed: usize,
}

impl ScriptedRoller {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            consumed: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceRoller for ScriptedRoller {
    fn die(&mut self, _sides: u32) -> Result<u32, RollError> {
        match self.rolls.pop_front() {
            Some(roll) => {
                self.consumed += 1;
                Ok(roll)
            }
            None => Err(RollError::Exhausted {
                consumed: self.consumed,
            }),
        }
    }
}

/// A conquest handler that records every transfer it is asked for.
#[derive(Debug, Clone, Default)]
pub struct RecordingConquests {
    pub transferred: Vec<LocationId>,
}

impl RecordingConquests {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConquestHandler for RecordingConquests {
    fn transfer_to_player(&mut self, location: LocationId) {
        self.transferred.push(location);
    }
}

/// A world with a fighter-profile player, ready for encounters.
pub fn sample_world() -> GameWorld {
    let mut world = GameWorld::new("Aveline");
    world.player.attributes = Attributes::new(14, 14, 12, 10, 10, 10);
    world.player.hp = 34;
    world.player.mp = 10;
    world
        .player
        .equipment
        .equip(Item::weapon("Shortsword", "1d6"));
    world
}

/// A level 1 goblin with fully specified combat fields.
pub fn sample_goblin() -> Character {
    Character::new("Goblin")
        .with_level(1)
        .with_hp(7)
        .with_armor_class(12)
        .with_attack_bonus(1)
        .with_damage("1d6")
}

/// A level 3 brigand wearing dex-capped armor.
pub fn sample_brigand() -> Character {
    Character::new("Brigand")
        .with_level(3)
        .with_hp(16)
        .with_armor_class(14)
        .with_attack_bonus(3)
        .with_damage("1d8+1")
}

/// A hunt target that drops a claimable trophy on defeat.
pub fn sample_hunt_target() -> Character {
    Character::new("Dire Boar")
        .with_level(2)
        .with_hp(12)
        .with_armor_class(11)
        .with_attack_bonus(2)
        .with_damage("1d6+1")
        .with_reward(
            Item::jewelry("Boar-Tusk Charm").with_bonus(BonusKind::Attack, 1),
        )
}
