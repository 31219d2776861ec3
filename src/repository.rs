//! Repositories for state that outlives the world record.
//!
//! Familiars and the player's backpack are persisted by the host application.
//! The engine only sees these traits, injected into the propagator and the
//! session, so combat math never depends on a specific storage mechanism.
//! In-memory implementations back tests and simple embedders.

use crate::world::{Familiar, FamiliarId, Inventory, Item};
use serde::{Deserialize, Serialize};

/// Load/save familiars by id.
pub trait FamiliarRepository {
    fn load(&self, id: FamiliarId) -> Option<Familiar>;
    fn save(&mut self, familiar: Familiar);
}

/// Load/save the player's backpack.
pub trait InventoryRepository {
    fn load(&self) -> Inventory;
    fn save(&mut self, inventory: Inventory);

    /// Add one item through a load/save round trip.
    fn add_item(&mut self, item: Item) {
        let mut inventory = self.load();
        inventory.add_item(item);
        self.save(inventory);
    }
}

/// Familiars held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryFamiliars {
    familiars: Vec<Familiar>,
}

impl InMemoryFamiliars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, familiar: Familiar) -> FamiliarId {
        let id = familiar.id;
        self.save(familiar);
        id
    }

    pub fn all(&self) -> &[Familiar] {
        &self.familiars
    }
}

impl FamiliarRepository for InMemoryFamiliars {
    fn load(&self, id: FamiliarId) -> Option<Familiar> {
        self.familiars.iter().find(|f| f.id == id).cloned()
    }

    fn save(&mut self, familiar: Familiar) {
        match self.familiars.iter_mut().find(|f| f.id == familiar.id) {
            Some(existing) => *existing = familiar,
            None => self.familiars.push(familiar),
        }
    }
}

/// A backpack held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryInventory {
    inventory: Inventory,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(inventory: Inventory) -> Self {
        Self { inventory }
    }
}

impl InventoryRepository for InMemoryInventory {
    fn load(&self) -> Inventory {
        self.inventory.clone()
    }

    fn save(&mut self, inventory: Inventory) {
        self.inventory = inventory;
    }
}
