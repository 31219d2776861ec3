//! Effective-stats derivation.
//!
//! Turns base attributes, equipped-item bonuses, and the active familiar's
//! passive bonus into the numbers combat resolution consumes. Pure function:
//! always recomputable from its inputs, never persisted, never hand-edited.

use crate::dice::{ArmorNotation, DamageExpr};
use crate::world::{Attribute, Attributes, BonusKind, EquipSlot, Equipment, EquipmentBonus};
use serde::{Deserialize, Serialize};

/// Derived combat numbers for one combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub attributes: Attributes,
    pub max_hp: i32,
    pub max_mp: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    /// Damage notation, e.g. "1d6+3". Parsed by the `dice` module at roll time.
    pub damage: String,
}

impl EffectiveStats {
    /// The block used outside encounter mode, where combat is meaningless.
    pub fn neutral() -> Self {
        Self {
            attributes: Attributes::neutral(),
            max_hp: 0,
            max_mp: 0,
            armor_class: 0,
            attack_bonus: 0,
            damage: DamageExpr::unarmed().to_string(),
        }
    }
}

// set() re-applies the base floor; effective scores may go below it.
fn add_to_attribute(attributes: &mut Attributes, attribute: Attribute, amount: i32) {
    match attribute {
        Attribute::Strength => attributes.strength += amount,
        Attribute::Dexterity => attributes.dexterity += amount,
        Attribute::Constitution => attributes.constitution += amount,
        Attribute::Intelligence => attributes.intelligence += amount,
        Attribute::Wisdom => attributes.wisdom += amount,
        Attribute::Charisma => attributes.charisma += amount,
    }
}

/// Derive effective stats from base attributes, equipment, and the active
/// familiar's passive bonus.
///
/// Attribute bonuses fold into the scores before anything is derived; MaxHp,
/// ArmorClass, Attack, and Damage bonuses stay flat and are applied after the
/// base formulas. A malformed weapon or armor notation is ignored and the
/// default formula kept.
pub fn derive_stats(
    base: &Attributes,
    equipment: &Equipment,
    familiar_bonus: Option<&EquipmentBonus>,
    rpg_mode: bool,
) -> EffectiveStats {
    if !rpg_mode {
        return EffectiveStats::neutral();
    }

    let mut attributes = *base;
    let mut flat_hp = 0;
    let mut flat_ac = 0;
    let mut flat_attack = 0;
    let mut flat_damage = 0;

    let bonuses = equipment
        .equipped()
        .flat_map(|item| item.bonuses.iter())
        .chain(familiar_bonus);
    for bonus in bonuses {
        match bonus.kind {
            BonusKind::Attribute(attribute) => {
                add_to_attribute(&mut attributes, attribute, bonus.amount)
            }
            BonusKind::MaxHp => flat_hp += bonus.amount,
            BonusKind::ArmorClass => flat_ac += bonus.amount,
            BonusKind::Attack => flat_attack += bonus.amount,
            BonusKind::Damage => flat_damage += bonus.amount,
        }
    }

    let strength_mod = attributes.modifier(Attribute::Strength);
    let dexterity_mod = attributes.modifier(Attribute::Dexterity);

    let max_hp = 10 + 2 * attributes.constitution + flat_hp;
    let max_mp = attributes.intelligence;
    let attack_bonus = strength_mod + flat_attack;

    // Damage: the weapon's dice replace the default 1d4; its embedded
    // modifier, the strength modifier, and flat damage bonuses all sum.
    let mut dice = DamageExpr::unarmed();
    let mut damage_modifier = strength_mod + flat_damage;
    if let Some(weapon) = equipment.in_slot(EquipSlot::Weapon) {
        if let Some(notation) = weapon.damage.as_deref() {
            if let Ok(expr) = DamageExpr::parse(notation) {
                damage_modifier += expr.modifier();
                if let Some((count, sides)) = expr.dice() {
                    dice = DamageExpr::Dice {
                        count,
                        sides,
                        modifier: 0,
                    };
                }
            }
        }
    }
    let damage = dice.with_modifier(damage_modifier).to_string();

    // Armor: a notation replaces the base formula entirely; flat AC bonuses
    // apply either way.
    let mut armor_class = 10 + attributes.dexterity;
    if let Some(armor) = equipment.in_slot(EquipSlot::Armor) {
        if let Some(notation) = armor.armor.as_deref() {
            if let Ok(parsed) = ArmorNotation::parse(notation) {
                armor_class = parsed.armor_class(dexterity_mod);
            }
        }
    }
    armor_class += flat_ac;

    EffectiveStats {
        attributes,
        max_hp,
        max_mp,
        armor_class,
        attack_bonus,
        damage,
    }
}
