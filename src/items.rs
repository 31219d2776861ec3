//! Standard equipment, consumable, and foe catalog.
//!
//! Predefined content the host application can reference by name when
//! assembling encounters or granting loot.

use crate::world::{Attribute, BonusKind, Character, CharacterId, ConsumableEffect, Item, ItemId};

// Lookups mint a fresh id per call so two copies of the same catalog entry
// never alias each other.
fn lookup(table: &[Item], name: &str) -> Option<Item> {
    let name_lower = name.to_lowercase();
    table
        .iter()
        .find(|item| item.name.to_lowercase() == name_lower)
        .cloned()
        .map(|item| Item {
            id: ItemId::new(),
            ..item
        })
}

/// Get a standard weapon by name.
pub fn get_weapon(name: &str) -> Option<Item> {
    lookup(&WEAPONS, name)
}

/// Get a standard armor piece by name.
pub fn get_armor(name: &str) -> Option<Item> {
    lookup(&ARMORS, name)
}

/// Get a standard jewelry piece by name.
pub fn get_jewelry(name: &str) -> Option<Item> {
    lookup(&JEWELRY, name)
}

/// Get a standard consumable by name.
pub fn get_consumable(name: &str) -> Option<Item> {
    lookup(&CONSUMABLES, name)
}

/// Get a standard foe by name.
pub fn get_foe(name: &str) -> Option<Character> {
    let name_lower = name.to_lowercase();
    FOES.iter()
        .find(|foe| foe.name.to_lowercase() == name_lower)
        .cloned()
        .map(|foe| Character {
            id: CharacterId::new(),
            ..foe
        })
}

/// Try to find any standard item by name.
pub fn find_item(name: &str) -> Option<Item> {
    get_weapon(name)
        .or_else(|| get_armor(name))
        .or_else(|| get_jewelry(name))
        .or_else(|| get_consumable(name))
}

lazy_static::lazy_static! {
    /// Standard weapons.
    pub static ref WEAPONS: Vec<Item> = vec![
        Item::weapon("Dagger", "1d4")
            .with_description("A short blade, quick in close quarters."),
        Item::weapon("Shortsword", "1d6"),
        Item::weapon("Longsword", "1d8"),
        Item::weapon("Greataxe", "1d12"),
        Item::weapon("Warhammer", "2d4"),
        Item::weapon("Masterwork Blade", "1d8+1")
            .with_description("Balanced steel; the edge carries its own bite."),
        Item::weapon("Flame Tongue", "1d8+2")
            .with_bonus(BonusKind::Damage, 1)
            .with_description("Smoulders faintly even at rest."),
    ];

    /// Standard armor. Notations follow the armor-class grammar.
    pub static ref ARMORS: Vec<Item> = vec![
        Item::armor("Padded Vest", "11 + Dex"),
        Item::armor("Leather Armor", "11 + Dex"),
        Item::armor("Studded Leather", "12 + Dex"),
        Item::armor("Chain Shirt", "13 + Dex (max +2)"),
        Item::armor("Scale Mail", "14 + Dex (max +2)"),
        Item::armor("Plate Armor", "18"),
        Item::armor("Warded Plate", "18")
            .with_bonus(BonusKind::ArmorClass, 1)
            .with_description("Etched with a thin lattice of protective sigils."),
    ];

    /// Standard jewelry. Bonuses only, no notations.
    pub static ref JEWELRY: Vec<Item> = vec![
        Item::jewelry("Ring of Vigor")
            .with_bonus(BonusKind::Attribute(Attribute::Constitution), 2),
        Item::jewelry("Band of Grace")
            .with_bonus(BonusKind::Attribute(Attribute::Dexterity), 2),
        Item::jewelry("Signet of Command")
            .with_bonus(BonusKind::Attribute(Attribute::Charisma), 2),
        Item::jewelry("Amulet of the Bear")
            .with_bonus(BonusKind::Attribute(Attribute::Strength), 1)
            .with_bonus(BonusKind::MaxHp, 5),
        Item::jewelry("Iron Talisman")
            .with_bonus(BonusKind::ArmorClass, 1),
        Item::jewelry("Hunter's Fang")
            .with_bonus(BonusKind::Attack, 1),
    ];

    /// Standard consumables, applied through the dice evaluator.
    pub static ref CONSUMABLES: Vec<Item> = vec![
        Item::consumable("Healing Draught", ConsumableEffect::Heal { dice: "2d4+2".to_string() })
            .with_description("Restores health when drunk."),
        Item::consumable("Greater Healing Draught", ConsumableEffect::Heal { dice: "4d4+4".to_string() }),
        Item::consumable("Flask of Wildfire", ConsumableEffect::Harm { dice: "2d6".to_string() })
            .with_description("Shatters on impact, burning everything nearby."),
        Item::consumable("Mana Philtre", ConsumableEffect::RestoreMana { amount: 5 }),
    ];

    /// Standard foes for assembling encounters.
    pub static ref FOES: Vec<Character> = vec![
        Character::new("Goblin")
            .with_level(1)
            .with_hp(7)
            .with_armor_class(12)
            .with_attack_bonus(1)
            .with_damage("1d6"),
        Character::new("Wolf")
            .with_level(1)
            .with_hp(9)
            .with_armor_class(13)
            .with_attack_bonus(2)
            .with_damage("1d4+1"),
        Character::new("Bandit")
            .with_level(2)
            .with_hp(11)
            .with_armor_class(12)
            .with_attack_bonus(2)
            .with_damage("1d6+1"),
        Character::new("Brigand Captain")
            .with_level(3)
            .with_hp(16)
            .with_armor_class(14)
            .with_attack_bonus(3)
            .with_damage("1d8+1"),
        Character::new("Ogre")
            .with_level(4)
            .with_hp(30)
            .with_armor_class(11)
            .with_attack_bonus(4)
            .with_damage("2d6+3"),
        Character::new("Dire Boar")
            .with_level(2)
            .with_hp(12)
            .with_armor_class(11)
            .with_attack_bonus(2)
            .with_damage("1d6+1")
            .with_reward(Item::jewelry("Boar-Tusk Charm").with_bonus(BonusKind::Attack, 1)),
    ];
}
