//! Turn-based combat engine for interactive-fiction campaigns.
//!
//! This crate provides:
//! - Effective-stats derivation from attributes, equipment, and familiars
//! - Dice and armor-class notation parsing with an injectable random source
//! - A one-call-per-turn combat resolver producing pure state snapshots
//! - Victory rewards, hunt-reward claims, and territory conquest signals
//! - Propagation of combat results back onto long-lived campaign records
//!
//! # Quick Start
//!
//! ```
//! use fable_core::{CombatSession, SessionConfig};
//! use fable_core::items::get_foe;
//!
//! let mut session = CombatSession::new(SessionConfig::new("Aveline"));
//! session.start_encounter(vec![get_foe("Goblin").unwrap()], None, None)?;
//!
//! let outcome = session.play_turn()?;
//! println!("{}", outcome.update.log);
//! # Ok::<(), fable_core::SessionError>(())
//! ```

pub mod combat;
pub mod dice;
pub mod items;
pub mod persist;
pub mod propagator;
pub mod repository;
pub mod resolver;
pub mod reward;
pub mod session;
pub mod stats;
pub mod testing;
pub mod world;

// Primary public API
pub use combat::{ActiveCombat, CombatPhase, Combatant, ConsumableTarget, Team};
pub use dice::{ArmorNotation, DamageExpr, DiceRoller, NotationError, RngRoller, RollError};
pub use propagator::{ConquestHandler, Notification};
pub use repository::{FamiliarRepository, InventoryRepository};
pub use resolver::{CombatUpdate, CombatantUpdate};
pub use reward::{RewardSnapshot, Rewards};
pub use session::{CombatSession, SessionConfig, SessionError, TurnOutcome};
pub use stats::{derive_stats, EffectiveStats};
pub use world::{
    Attribute, Attributes, BonusKind, Character, CharacterId, ConsumableEffect, EquipSlot,
    Equipment, EquipmentBonus, Faction, Familiar, FamiliarId, GameWorld, Inventory, Item, ItemId,
    Location, LocationId, Player, StatusEffect,
};
