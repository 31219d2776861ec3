//! Per-turn combat resolution.
//!
//! One call resolves one full turn: the player acts, then every surviving
//! enemy acts. The resolver never mutates its inputs; it clones the snapshot,
//! works on the copy, and returns a [`CombatUpdate`] carrying the next
//! snapshot and everything the propagator needs to fold back into long-lived
//! state. Calling it on an already-ended encounter is a caller error guarded
//! at the session boundary, not here.

use crate::combat::{ActiveCombat, CombatPhase, Team};
use crate::dice::{DamageExpr, DiceRoller, RollError};
use crate::reward::{compute_rewards, RewardSnapshot, Rewards};
use crate::stats::EffectiveStats;
use crate::world::{CharacterId, GameWorld, Item, LocationId, StatusEffect, DEFAULT_ARMOR_CLASS};
use serde::{Deserialize, Serialize};

/// Per-combatant state after a resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantUpdate {
    pub character_id: CharacterId,
    pub hp: i32,
    pub mp: Option<i32>,
    pub statuses: Vec<StatusEffect>,
    pub defeated: bool,
}

/// Everything one resolved turn produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatUpdate {
    pub combatants: Vec<CombatantUpdate>,
    pub combat_ended: bool,
    pub phase: CombatPhase,
    pub experience: u32,
    pub currency: u32,
    pub items: Vec<Item>,
    /// The full turn log, one line per event.
    pub log: String,
    /// The next snapshot, present only while the encounter continues.
    pub next_combat: Option<ActiveCombat>,
    /// Set when victory happened on contested ground.
    pub conquered_location: Option<LocationId>,
}

fn roll_attack(
    roller: &mut dyn DiceRoller,
    attack_bonus: i32,
) -> Result<i32, RollError> {
    Ok(roller.d20()? as i32 + attack_bonus)
}

// Damage goes through the parser so a bad notation costs a log line and a
// single point of damage, never the turn.
fn roll_notation_damage(
    notation: &str,
    attacker_name: &str,
    roller: &mut dyn DiceRoller,
    log: &mut Vec<String>,
) -> Result<i32, RollError> {
    match DamageExpr::parse(notation) {
        Ok(expr) => expr.roll(roller),
        Err(_) => {
            log.push(format!(
                "{attacker_name}'s damage notation \"{notation}\" is unreadable; dealing 1 damage."
            ));
            Ok(1)
        }
    }
}

/// Resolve exactly one turn of the encounter.
pub fn resolve_turn(
    world: &GameWorld,
    combat: &ActiveCombat,
    player_stats: &EffectiveStats,
    snapshot: &RewardSnapshot,
    roller: &mut dyn DiceRoller,
) -> Result<CombatUpdate, RollError> {
    let mut next = combat.clone();
    let mut log: Vec<String> = Vec::new();
    let player_id = world.player.id;

    // 1. Player attacks the first living enemy in roster order.
    let player_alive = next
        .combatant(player_id)
        .map(|c| c.is_alive())
        .unwrap_or(false);
    if player_alive {
        let target_id = next
            .combatants
            .iter()
            .find(|c| c.team == Team::Enemy && c.is_alive())
            .map(|c| c.character_id);
        if let Some(target_id) = target_id {
            let target_ac = world
                .character(target_id)
                .map(|c| c.armor_class_or_default())
                .unwrap_or(DEFAULT_ARMOR_CLASS);
            let target_name = next.combatant(target_id).map(|c| c.name.clone()).unwrap_or_default();
            let attack = roll_attack(roller, player_stats.attack_bonus)?;
            if attack >= target_ac {
                let damage = roll_notation_damage(
                    &player_stats.damage,
                    &world.player.name,
                    roller,
                    &mut log,
                )?;
                let downed = next
                    .combatant_mut(target_id)
                    .map(|c| c.apply_damage(damage))
                    .unwrap_or(false);
                log.push(format!(
                    "{} hits {} for {} damage ({} vs AC {}).",
                    world.player.name, target_name, damage, attack, target_ac
                ));
                if downed {
                    log.push(format!("{target_name} is defeated!"));
                }
            } else {
                log.push(format!(
                    "{} misses {} ({} vs AC {}).",
                    world.player.name, target_name, attack, target_ac
                ));
            }
        }
    }

    // 2. Every enemy still standing attacks a random living defender.
    let attackers: Vec<CharacterId> = next
        .living(Team::Enemy)
        .map(|c| c.character_id)
        .collect();
    for enemy_id in attackers {
        let defenders: Vec<CharacterId> = next
            .living(Team::Player)
            .map(|c| c.character_id)
            .collect();
        if defenders.is_empty() {
            break;
        }
        let target_id = defenders[roller.uniform(defenders.len() as u32)? as usize];

        let record = world.character(enemy_id);
        let attack_bonus = record.map(|c| c.attack_bonus_or_default()).unwrap_or(0);
        let target_ac = if target_id == player_id {
            player_stats.armor_class
        } else {
            world
                .character(target_id)
                .map(|c| c.armor_class_or_default())
                .unwrap_or(DEFAULT_ARMOR_CLASS)
        };
        let enemy_name = next.combatant(enemy_id).map(|c| c.name.clone()).unwrap_or_default();
        let target_name = next.combatant(target_id).map(|c| c.name.clone()).unwrap_or_default();

        let attack = roll_attack(roller, attack_bonus)?;
        if attack >= target_ac {
            let notation = record
                .map(|c| c.damage_notation().to_string())
                .unwrap_or_else(|| crate::world::DEFAULT_DAMAGE.to_string());
            let damage = roll_notation_damage(&notation, &enemy_name, roller, &mut log)?;
            let downed = next
                .combatant_mut(target_id)
                .map(|c| c.apply_damage(damage))
                .unwrap_or(false);
            log.push(format!(
                "{enemy_name} hits {target_name} for {damage} damage ({attack} vs AC {target_ac})."
            ));
            if downed {
                log.push(format!("{target_name} is defeated!"));
            }
        } else {
            log.push(format!(
                "{enemy_name} misses {target_name} ({attack} vs AC {target_ac})."
            ));
        }
    }

    // 3-4. End-of-encounter rule.
    let all_enemies_defeated = next.all_defeated(Team::Enemy);
    let all_players_defeated = next.all_defeated(Team::Player);
    let pending_reward = all_enemies_defeated && next.has_pending_reward();
    let combat_ended = (all_enemies_defeated || all_players_defeated) && !pending_reward;

    // 5. Rewards and conquest on a genuine victory.
    let mut rewards = Rewards::default();
    let mut conquered_location = None;
    if combat_ended && all_enemies_defeated {
        let defeated: Vec<CharacterId> = next
            .team(Team::Enemy)
            .filter(|c| c.defeated)
            .map(|c| c.character_id)
            .collect();
        rewards = compute_rewards(snapshot, defeated, roller)?;
        log.push(format!(
            "Victoire! You gain {} experience and {} gold.",
            rewards.experience, rewards.currency
        ));
        if let Some(location) = next.contested_location {
            let location_name = world
                .location(location)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| "The area".to_string());
            log.push(format!("{location_name} falls under your control!"));
            conquered_location = Some(location);
        }
    } else if pending_reward {
        log.push("All foes are down, but a trophy remains unclaimed.".to_string());
    } else if combat_ended {
        log.push("The battle is lost.".to_string());
    }

    // Status-effect durations tick at the end of a turn that continues.
    if !combat_ended {
        for combatant in &mut next.combatants {
            let name = combatant.name.clone();
            combatant.statuses.retain_mut(|status| {
                status.remaining_turns = status.remaining_turns.saturating_sub(1);
                if status.remaining_turns == 0 {
                    log.push(format!("{} is no longer {}.", name, status.name));
                    false
                } else {
                    true
                }
            });
        }
    }

    // 6. Emit the update; the next snapshot only exists while fighting goes on.
    next.is_active = !combat_ended;
    let phase = next.phase();
    let combatants = next
        .combatants
        .iter()
        .map(|c| CombatantUpdate {
            character_id: c.character_id,
            hp: c.hp,
            mp: c.mp,
            statuses: c.statuses.clone(),
            defeated: c.defeated,
        })
        .collect();

    Ok(CombatUpdate {
        combatants,
        combat_ended,
        phase,
        experience: rewards.experience,
        currency: rewards.currency,
        items: rewards.items,
        log: log.join("\n"),
        next_combat: (!combat_ended).then_some(next),
        conquered_location,
    })
}

/// Claim a pending hunt reward from a defeated combatant.
///
/// Returns the claimed item and the successor snapshot; the snapshot goes
/// inactive once no unclaimed rewards remain, which is the transition that
/// fully ends the encounter. Claiming from a combatant that is not defeated
/// or carries no reward is a no-op (`None`).
pub fn claim_reward(
    combat: &ActiveCombat,
    combatant_id: CharacterId,
) -> Option<(Item, ActiveCombat)> {
    let combatant = combat.combatant(combatant_id)?;
    if !combatant.defeated || combatant.reward.is_none() {
        return None;
    }
    let mut next = combat.clone();
    let item = next.combatant_mut(combatant_id)?.reward.take()?;
    next.is_active = next.has_pending_reward();
    Some((item, next))
}
