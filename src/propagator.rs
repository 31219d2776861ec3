//! Folding combat results back into long-lived state.
//!
//! The propagator is the only writer of shared state. It runs after
//! resolution completes, on the single calling thread, and produces the
//! user-visible notifications (familiar level-ups, conquests) that the
//! resolver itself never emits.

use crate::repository::FamiliarRepository;
use crate::resolver::CombatUpdate;
use crate::world::{Faction, FamiliarId, GameWorld, LocationId};
use serde::{Deserialize, Serialize};

/// External collaborator that records a change of territory ownership.
pub trait ConquestHandler {
    fn transfer_to_player(&mut self, location: LocationId);
}

/// For embedders that track ownership nowhere outside the world record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConquestHandler;

impl ConquestHandler for NullConquestHandler {
    fn transfer_to_player(&mut self, _location: LocationId) {}
}

/// User-visible events produced while folding an update back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    FamiliarLevelUp {
        familiar: FamiliarId,
        name: String,
        new_level: u32,
    },
    Conquest {
        location: LocationId,
        name: String,
    },
}

/// Apply a resolved turn to the world, the familiar store, and the conquest
/// collaborator. Returns the notifications the host should surface.
pub fn apply_update(
    world: &mut GameWorld,
    update: &CombatUpdate,
    familiars: &mut dyn FamiliarRepository,
    conquests: &mut dyn ConquestHandler,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    // Write each combatant back onto its owning record; the player's live
    // fields get the same treatment.
    for combatant in &update.combatants {
        if combatant.character_id == world.player.id {
            world.player.hp = combatant.hp;
            if let Some(mp) = combatant.mp {
                world.player.mp = mp;
            }
        }
        if let Some(character) = world.character_mut(combatant.character_id) {
            character.hp = combatant.hp;
            character.mp = combatant.mp;
            character.statuses = combatant.statuses.clone();
            character.defeated = combatant.defeated;
        }
    }

    if update.combat_ended && update.experience > 0 {
        world.player.experience += update.experience;
        if let Some(id) = world.player.active_familiar {
            if let Some(mut familiar) = familiars.load(id) {
                let levels_gained = familiar.grant_experience(update.experience);
                for step in 1..=levels_gained {
                    notifications.push(Notification::FamiliarLevelUp {
                        familiar: familiar.id,
                        name: familiar.name.clone(),
                        new_level: familiar.level - levels_gained + step,
                    });
                }
                familiars.save(familiar);
            }
        }
    }

    if update.currency > 0 {
        world.player.currency = world.player.currency.saturating_add(update.currency);
    }

    // Swap the single combat slot: next snapshot while fighting, empty after.
    world.combat = if update.combat_ended {
        None
    } else {
        update.next_combat.clone()
    };

    if update.combat_ended {
        if let Some(location_id) = update.conquered_location {
            let name = match world.location_mut(location_id) {
                Some(location) => {
                    location.controlled_by = Faction::Player;
                    location.name.clone()
                }
                None => String::new(),
            };
            conquests.transfer_to_player(location_id);
            notifications.push(Notification::Conquest {
                location: location_id,
                name,
            });
        }
    }

    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{ActiveCombat, CombatPhase};
    use crate::repository::InMemoryFamiliars;
    use crate::resolver::CombatantUpdate;
    use crate::testing::RecordingConquests;
    use crate::world::{Character, Familiar, Location, StatusEffect};

    fn update_template() -> CombatUpdate {
        CombatUpdate {
            combatants: Vec::new(),
            combat_ended: false,
            phase: CombatPhase::Active,
            experience: 0,
            currency: 0,
            items: Vec::new(),
            log: String::new(),
            next_combat: None,
            conquered_location: None,
        }
    }

    #[test]
    fn test_write_back_to_character_and_player() {
        let mut world = GameWorld::new("Hero");
        world.player.hp = 20;
        world.player.mp = 8;
        let enemy_id = world.add_character(Character::new("Wolf").with_hp(9));

        let mut update = update_template();
        update.combatants = vec![
            CombatantUpdate {
                character_id: world.player.id,
                hp: 13,
                mp: Some(5),
                statuses: vec![StatusEffect::new("poisoned", 2)],
                defeated: false,
            },
            CombatantUpdate {
                character_id: enemy_id,
                hp: 0,
                mp: None,
                statuses: Vec::new(),
                defeated: true,
            },
        ];

        let mut familiars = InMemoryFamiliars::new();
        let mut conquests = RecordingConquests::new();
        apply_update(&mut world, &update, &mut familiars, &mut conquests);

        assert_eq!(world.player.hp, 13);
        assert_eq!(world.player.mp, 5);
        let wolf = world.character(enemy_id).unwrap();
        assert_eq!(wolf.hp, 0);
        assert!(wolf.defeated);
    }

    #[test]
    fn test_experience_and_currency_on_victory() {
        let mut world = GameWorld::new("Hero");
        world.player.experience = 40;
        world.player.currency = 7;

        let mut update = update_template();
        update.combat_ended = true;
        update.phase = CombatPhase::Victory;
        update.experience = 30;
        update.currency = 6;

        let mut familiars = InMemoryFamiliars::new();
        let mut conquests = RecordingConquests::new();
        apply_update(&mut world, &update, &mut familiars, &mut conquests);

        assert_eq!(world.player.experience, 70);
        assert_eq!(world.player.currency, 13);
    }

    #[test]
    fn test_familiar_levels_up_with_notification() {
        let mut world = GameWorld::new("Hero");
        let mut familiars = InMemoryFamiliars::new();
        let mut familiar = Familiar::new("Ember");
        familiar.experience = 90;
        let familiar_id = familiars.insert(familiar);
        world.player.active_familiar = Some(familiar_id);

        let mut update = update_template();
        update.combat_ended = true;
        update.phase = CombatPhase::Victory;
        update.experience = 20;

        let mut conquests = RecordingConquests::new();
        let notifications = apply_update(&mut world, &update, &mut familiars, &mut conquests);

        let saved = familiars.load(familiar_id).unwrap();
        assert_eq!(saved.level, 2);
        assert_eq!(saved.experience, 10);
        assert_eq!(saved.experience_threshold, 150);
        assert_eq!(
            notifications,
            vec![Notification::FamiliarLevelUp {
                familiar: familiar_id,
                name: "Ember".to_string(),
                new_level: 2,
            }]
        );
    }

    #[test]
    fn test_familiar_untouched_while_combat_continues() {
        let mut world = GameWorld::new("Hero");
        let mut familiars = InMemoryFamiliars::new();
        let familiar_id = familiars.insert(Familiar::new("Ember"));
        world.player.active_familiar = Some(familiar_id);

        // Pending-reward turns report experience 0 and no ending
        let mut update = update_template();
        update.phase = CombatPhase::VictoryPendingReward;
        update.next_combat = Some(ActiveCombat::new("a cave"));

        let mut conquests = RecordingConquests::new();
        let notifications = apply_update(&mut world, &update, &mut familiars, &mut conquests);
        assert!(notifications.is_empty());
        assert_eq!(familiars.load(familiar_id).unwrap().experience, 0);
        assert!(world.combat.is_some());
    }

    #[test]
    fn test_combat_slot_cleared_on_ending() {
        let mut world = GameWorld::new("Hero");
        world.combat = Some(ActiveCombat::new("a bridge"));

        let mut update = update_template();
        update.combat_ended = true;
        update.phase = CombatPhase::Defeat;

        let mut familiars = InMemoryFamiliars::new();
        let mut conquests = RecordingConquests::new();
        apply_update(&mut world, &update, &mut familiars, &mut conquests);
        assert!(world.combat.is_none());
    }

    #[test]
    fn test_conquest_flips_ownership_and_notifies() {
        let mut world = GameWorld::new("Hero");
        let location_id = world.add_location(
            Location::new("Old Mill").with_controller(Faction::Rival("Bandits".to_string())),
        );

        let mut update = update_template();
        update.combat_ended = true;
        update.phase = CombatPhase::Victory;
        update.conquered_location = Some(location_id);

        let mut familiars = InMemoryFamiliars::new();
        let mut conquests = RecordingConquests::new();
        let notifications = apply_update(&mut world, &update, &mut familiars, &mut conquests);

        assert_eq!(
            world.location(location_id).unwrap().controlled_by,
            Faction::Player
        );
        assert_eq!(conquests.transferred, vec![location_id]);
        assert!(matches!(
            notifications.as_slice(),
            [Notification::Conquest { location, .. }] if *location == location_id
        ));
    }
}
