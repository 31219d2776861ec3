//! Campaign world types.
//!
//! Long-lived records for the player, non-player characters, familiars,
//! locations, items, and the world container that combat resolution reads from
//! and the update propagator writes back onto.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for familiars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FamiliarId(pub Uuid);

impl FamiliarId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FamiliarId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub Uuid);

impl LocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The six attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Attribute {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Constitution => "CON",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Charisma => "CHA",
        }
    }

    pub fn all() -> [Attribute; 6] {
        [
            Attribute::Strength,
            Attribute::Dexterity,
            Attribute::Constitution,
            Attribute::Intelligence,
            Attribute::Wisdom,
            Attribute::Charisma,
        ]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Attribute scores container.
///
/// Base scores never drop below 8; only equipment and familiar bonuses applied
/// during stats derivation may push an effective score lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

/// Floor applied to every base attribute.
pub const ATTRIBUTE_FLOOR: i32 = 8;

impl Attributes {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str.max(ATTRIBUTE_FLOOR),
            dexterity: dex.max(ATTRIBUTE_FLOOR),
            constitution: con.max(ATTRIBUTE_FLOOR),
            intelligence: int.max(ATTRIBUTE_FLOOR),
            wisdom: wis.max(ATTRIBUTE_FLOOR),
            charisma: cha.max(ATTRIBUTE_FLOOR),
        }
    }

    /// All scores at the floor.
    pub fn neutral() -> Self {
        Self::new(
            ATTRIBUTE_FLOOR,
            ATTRIBUTE_FLOOR,
            ATTRIBUTE_FLOOR,
            ATTRIBUTE_FLOOR,
            ATTRIBUTE_FLOOR,
            ATTRIBUTE_FLOOR,
        )
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: i32) {
        let value = value.max(ATTRIBUTE_FLOOR);
        match attribute {
            Attribute::Strength => self.strength = value,
            Attribute::Dexterity => self.dexterity = value,
            Attribute::Constitution => self.constitution = value,
            Attribute::Intelligence => self.intelligence = value,
            Attribute::Wisdom => self.wisdom = value,
            Attribute::Charisma => self.charisma = value,
        }
    }

    /// The modifier for a score: 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
    ///
    /// Floor division keeps odd low scores correct.
    pub fn modifier(&self, attribute: Attribute) -> i32 {
        (self.get(attribute) - 10).div_euclid(2)
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// The modifier for a raw score, for callers that hold a score outside an
/// [`Attributes`] block.
pub fn score_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

// ============================================================================
// Equipment Bonuses
// ============================================================================

/// What a bonus applies to.
///
/// A closed set so the derivation engine can switch over it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKind {
    Attribute(Attribute),
    MaxHp,
    ArmorClass,
    Attack,
    Damage,
}

/// A single signed bonus carried by an item or a familiar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBonus {
    pub kind: BonusKind,
    pub amount: i32,
}

impl EquipmentBonus {
    pub fn new(kind: BonusKind, amount: i32) -> Self {
        Self { kind, amount }
    }
}

impl fmt::Display for EquipmentBonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.kind {
            BonusKind::Attribute(attribute) => attribute.abbreviation(),
            BonusKind::MaxHp => "HP",
            BonusKind::ArmorClass => "AC",
            BonusKind::Attack => "attack",
            BonusKind::Damage => "damage",
        };
        if self.amount >= 0 {
            write!(f, "+{} {}", self.amount, target)
        } else {
            write!(f, "{} {}", self.amount, target)
        }
    }
}

// ============================================================================
// Status Effects
// ============================================================================

/// A named effect with a remaining duration in turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub remaining_turns: u32,
}

impl StatusEffect {
    pub fn new(name: impl Into<String>, remaining_turns: u32) -> Self {
        Self {
            name: name.into(),
            remaining_turns,
        }
    }
}

// ============================================================================
// Items and Equipment
// ============================================================================

/// Equip slots. An item fits at most one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Jewelry,
}

impl EquipSlot {
    pub fn name(&self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
            EquipSlot::Jewelry => "jewelry",
        }
    }
}

/// One-shot item effects, applied through the dice evaluator outside the
/// normal per-turn flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumableEffect {
    /// Restore hit points by a damage-notation amount.
    Heal { dice: String },
    /// Deal damage by a damage-notation amount.
    Harm { dice: String },
    /// Restore a fixed amount of magic points.
    RestoreMana { amount: i32 },
}

/// An inventory item.
///
/// Bonuses are owned by the item; they only take effect while the item is
/// equipped. Weapons may carry a damage notation and armor an armor-class
/// notation, both parsed by the `dice` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub slot: Option<EquipSlot>,
    pub bonuses: Vec<EquipmentBonus>,
    pub damage: Option<String>,
    pub armor: Option<String>,
    pub consumable: Option<ConsumableEffect>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            description: None,
            slot: None,
            bonuses: Vec::new(),
            damage: None,
            armor: None,
            consumable: None,
        }
    }

    /// A weapon with its damage notation.
    pub fn weapon(name: impl Into<String>, damage: impl Into<String>) -> Self {
        let mut item = Self::new(name);
        item.slot = Some(EquipSlot::Weapon);
        item.damage = Some(damage.into());
        item
    }

    /// An armor piece with its armor-class notation.
    pub fn armor(name: impl Into<String>, notation: impl Into<String>) -> Self {
        let mut item = Self::new(name);
        item.slot = Some(EquipSlot::Armor);
        item.armor = Some(notation.into());
        item
    }

    /// A jewelry piece (bonuses only).
    pub fn jewelry(name: impl Into<String>) -> Self {
        let mut item = Self::new(name);
        item.slot = Some(EquipSlot::Jewelry);
        item
    }

    /// A consumable with its effect.
    pub fn consumable(name: impl Into<String>, effect: ConsumableEffect) -> Self {
        let mut item = Self::new(name);
        item.consumable = Some(effect);
        item
    }

    pub fn with_bonus(mut self, kind: BonusKind, amount: i32) -> Self {
        self.bonuses.push(EquipmentBonus::new(kind, amount));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The three equip slots and what currently occupies them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub jewelry: Option<Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip an item into its slot, returning whatever previously occupied
    /// that slot. An item without an equip slot is handed back unchanged.
    pub fn equip(&mut self, item: Item) -> Option<Item> {
        let Some(slot) = item.slot else {
            return Some(item);
        };
        match slot {
            EquipSlot::Weapon => self.weapon.replace(item),
            EquipSlot::Armor => self.armor.replace(item),
            EquipSlot::Jewelry => self.jewelry.replace(item),
        }
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<Item> {
        match slot {
            EquipSlot::Weapon => self.weapon.take(),
            EquipSlot::Armor => self.armor.take(),
            EquipSlot::Jewelry => self.jewelry.take(),
        }
    }

    pub fn in_slot(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
            EquipSlot::Jewelry => self.jewelry.as_ref(),
        }
    }

    /// All currently equipped items.
    pub fn equipped(&self) -> impl Iterator<Item = &Item> {
        self.weapon
            .iter()
            .chain(self.armor.iter())
            .chain(self.jewelry.iter())
    }
}

/// The player's backpack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Find an item by name, case-insensitive.
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        let name_lower = name.to_lowercase();
        self.items
            .iter()
            .find(|item| item.name.to_lowercase() == name_lower)
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.find_item(name).is_some()
    }
}

// ============================================================================
// Characters
// ============================================================================

/// Default armor class for a character record that does not specify one.
pub const DEFAULT_ARMOR_CLASS: i32 = 10;
/// Default damage notation for a character record that does not specify one.
pub const DEFAULT_DAMAGE: &str = "1d4";
/// Default level for a character record that does not specify one.
pub const DEFAULT_LEVEL: u32 = 1;

/// A long-lived non-player character record.
///
/// Combat fields are optional: partially-specified characters stay playable
/// through documented defaults instead of raising errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: Option<String>,
    pub level: Option<u32>,
    pub max_hp: i32,
    pub hp: i32,
    pub max_mp: Option<i32>,
    pub mp: Option<i32>,
    pub armor_class: Option<i32>,
    pub attack_bonus: Option<i32>,
    pub damage: Option<String>,
    pub statuses: Vec<StatusEffect>,
    pub defeated: bool,
    /// A lootable item dropped on defeat ("hunt" targets).
    pub reward: Option<Item>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            description: None,
            level: None,
            max_hp: 10,
            hp: 10,
            max_mp: None,
            mp: None,
            armor_class: None,
            attack_bonus: None,
            damage: None,
            statuses: Vec::new(),
            defeated: false,
            reward: None,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = max_hp;
        self.hp = max_hp;
        self
    }

    pub fn with_mp(mut self, max_mp: i32) -> Self {
        self.max_mp = Some(max_mp);
        self.mp = Some(max_mp);
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = Some(armor_class);
        self
    }

    pub fn with_attack_bonus(mut self, attack_bonus: i32) -> Self {
        self.attack_bonus = Some(attack_bonus);
        self
    }

    pub fn with_damage(mut self, damage: impl Into<String>) -> Self {
        self.damage = Some(damage.into());
        self
    }

    pub fn with_reward(mut self, reward: Item) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn armor_class_or_default(&self) -> i32 {
        self.armor_class.unwrap_or(DEFAULT_ARMOR_CLASS)
    }

    pub fn attack_bonus_or_default(&self) -> i32 {
        self.attack_bonus.unwrap_or(0)
    }

    pub fn damage_notation(&self) -> &str {
        self.damage.as_deref().unwrap_or(DEFAULT_DAMAGE)
    }

    pub fn level_or_default(&self) -> u32 {
        self.level.unwrap_or(DEFAULT_LEVEL)
    }
}

// ============================================================================
// Player
// ============================================================================

/// The player's long-lived record.
///
/// Carries a `CharacterId` of its own so combatant projections reference the
/// player and non-player characters uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: CharacterId,
    pub name: String,
    pub attributes: Attributes,
    pub hp: i32,
    pub mp: i32,
    pub experience: u32,
    pub currency: u32,
    pub equipment: Equipment,
    pub active_familiar: Option<FamiliarId>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            attributes: Attributes::default(),
            hp: 0,
            mp: 0,
            experience: 0,
            currency: 0,
            equipment: Equipment::new(),
            active_familiar: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

// ============================================================================
// Familiars
// ============================================================================

/// Experience a familiar needs to go from level 1 to level 2.
pub const FAMILIAR_BASE_THRESHOLD: u32 = 100;

/// A companion that grants one passive bonus and levels up from combat
/// experience independently of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Familiar {
    pub id: FamiliarId,
    pub name: String,
    pub bonus: Option<EquipmentBonus>,
    pub level: u32,
    pub experience: u32,
    pub experience_threshold: u32,
}

impl Familiar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FamiliarId::new(),
            name: name.into(),
            bonus: None,
            level: 1,
            experience: 0,
            experience_threshold: FAMILIAR_BASE_THRESHOLD,
        }
    }

    pub fn with_bonus(mut self, kind: BonusKind, amount: i32) -> Self {
        self.bonus = Some(EquipmentBonus::new(kind, amount));
        self
    }

    /// `floor(100 * 1.5^(level-1))`: the experience needed to clear `level`.
    pub fn threshold_for_level(level: u32) -> u32 {
        (FAMILIAR_BASE_THRESHOLD as f64 * 1.5f64.powi(level as i32 - 1)).floor() as u32
    }

    /// Accumulate experience, consuming thresholds as they are reached.
    /// Returns the number of levels gained.
    pub fn grant_experience(&mut self, amount: u32) -> u32 {
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= self.experience_threshold {
            self.experience -= self.experience_threshold;
            self.level += 1;
            self.experience_threshold = Self::threshold_for_level(self.level);
            gained += 1;
        }
        gained
    }
}

// ============================================================================
// Locations
// ============================================================================

/// Who controls a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Rival(String),
    Neutral,
}

/// A location that can be contested through combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: Option<String>,
    pub controlled_by: Faction,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: None,
            controlled_by: Faction::Neutral,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_controller(mut self, faction: Faction) -> Self {
        self.controlled_by = faction;
        self
    }
}

// ============================================================================
// Game World
// ============================================================================

/// The complete long-lived game state the combat engine operates against.
///
/// Familiars and the player's backpack live behind repository traits rather
/// than in this record; see the `repository` module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameWorld {
    pub player: Player,
    pub characters: Vec<Character>,
    pub locations: Vec<Location>,
    pub combat: Option<crate::combat::ActiveCombat>,
    pub rpg_mode: bool,
}

impl GameWorld {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player: Player::new(player_name),
            characters: Vec::new(),
            locations: Vec::new(),
            combat: None,
            rpg_mode: true,
        }
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|character| character.id == id)
    }

    pub fn add_character(&mut self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.push(character);
        id
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|location| location.id == id)
    }

    pub fn location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|location| location.id == id)
    }

    pub fn add_location(&mut self, location: Location) -> LocationId {
        let id = location.id;
        self.locations.push(location);
        id
    }
}
