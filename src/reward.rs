//! Victory rewards.
//!
//! Reward formulas read enemy levels from a snapshot taken when the encounter
//! starts, so in-combat changes (debuffs, level drains, record edits) never
//! skew what a victory pays out.

use crate::combat::{ActiveCombat, Team};
use crate::dice::{DiceRoller, RollError};
use crate::world::{CharacterId, GameWorld, Item, DEFAULT_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only enemy levels captured at encounter start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardSnapshot {
    levels: HashMap<CharacterId, u32>,
}

impl RewardSnapshot {
    /// Capture the level of every enemy in the roster from its owning
    /// character record.
    pub fn capture(combat: &ActiveCombat, world: &GameWorld) -> Self {
        let levels = combat
            .team(Team::Enemy)
            .map(|combatant| {
                let level = world
                    .character(combatant.character_id)
                    .map(|character| character.level_or_default())
                    .unwrap_or(DEFAULT_LEVEL);
                (combatant.character_id, level)
            })
            .collect();
        Self { levels }
    }

    pub fn level(&self, id: CharacterId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(DEFAULT_LEVEL)
    }
}

/// What a victory pays out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u32,
    pub currency: u32,
    /// Populated by external reward tables; pass-through here.
    pub items: Vec<Item>,
}

/// Sum reward contributions for the given defeated enemies.
///
/// Per enemy of snapshot level L: experience += L×10, currency +=
/// `floor(random()×L×5) + L` (observable range `[L, 6L−1]`, drawn
/// independently per enemy).
pub fn compute_rewards(
    snapshot: &RewardSnapshot,
    defeated: impl IntoIterator<Item = CharacterId>,
    roller: &mut dyn DiceRoller,
) -> Result<Rewards, RollError> {
    let mut rewards = Rewards::default();
    for id in defeated {
        let level = snapshot.level(id);
        rewards.experience += level * 10;
        rewards.currency += roller.uniform(level * 5)? + level;
    }
    Ok(rewards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Combatant;
    use crate::dice::RngRoller;
    use crate::testing::ScriptedRoller;
    use crate::world::Character;

    fn snapshot_for(levels: &[(CharacterId, u32)]) -> RewardSnapshot {
        RewardSnapshot {
            levels: levels.iter().copied().collect(),
        }
    }

    #[test]
    fn test_experience_is_level_times_ten() {
        let first = CharacterId::new();
        let second = CharacterId::new();
        let snapshot = snapshot_for(&[(first, 3), (second, 5)]);
        let mut roller = RngRoller::seeded(1);
        let rewards = compute_rewards(&snapshot, [first, second], &mut roller).unwrap();
        assert_eq!(rewards.experience, 80);
    }

    #[test]
    fn test_currency_within_bounds() {
        let id = CharacterId::new();
        let snapshot = snapshot_for(&[(id, 4)]);
        let mut roller = RngRoller::seeded(9);
        for _ in 0..200 {
            let rewards = compute_rewards(&snapshot, [id], &mut roller).unwrap();
            // floor(random()×20) + 4 lands in [4, 23]
            assert!((4..=23).contains(&rewards.currency));
        }
    }

    #[test]
    fn test_currency_scripted() {
        let id = CharacterId::new();
        let snapshot = snapshot_for(&[(id, 2)]);
        // uniform(10) consumes one d10: roll 7 -> floor value 6, plus level 2
        let mut roller = ScriptedRoller::new([7]);
        let rewards = compute_rewards(&snapshot, [id], &mut roller).unwrap();
        assert_eq!(rewards.currency, 8);
    }

    #[test]
    fn test_unknown_enemy_defaults_to_level_one() {
        let snapshot = RewardSnapshot::default();
        let mut roller = ScriptedRoller::new([3]);
        let rewards = compute_rewards(&snapshot, [CharacterId::new()], &mut roller).unwrap();
        assert_eq!(rewards.experience, 10);
        assert!((1..=5).contains(&rewards.currency));
    }

    #[test]
    fn test_snapshot_immune_to_later_edits() {
        let mut world = GameWorld::new("Tester");
        let enemy = Character::new("Wolf").with_level(4).with_hp(8);
        let enemy_id = world.add_character(enemy);

        let combat = ActiveCombat::new("forest").with_combatant(Combatant::from_character(
            world.character(enemy_id).unwrap(),
            Team::Enemy,
        ));
        let snapshot = RewardSnapshot::capture(&combat, &world);

        // A mid-encounter record edit must not change the payout
        world.character_mut(enemy_id).unwrap().level = Some(9);
        let mut roller = RngRoller::seeded(5);
        let rewards = compute_rewards(&snapshot, [enemy_id], &mut roller).unwrap();
        assert_eq!(rewards.experience, 40);
    }
}
