//! Campaign persistence for save/load functionality.
//!
//! Serializes the complete engine state (world, familiars, backpack) as
//! human-readable JSON with a version stamp for compatibility checking.

use crate::repository::{InMemoryFamiliars, InMemoryInventory};
use crate::world::GameWorld;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved game with all state needed to resume play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (seconds since the epoch).
    pub saved_at: String,

    /// The complete game world state.
    pub world: GameWorld,

    /// All known familiars.
    pub familiars: InMemoryFamiliars,

    /// The player's backpack.
    pub inventory: InMemoryInventory,

    /// Metadata about the save.
    pub metadata: SaveMetadata,
}

/// Metadata about the save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// Player name.
    pub player_name: String,

    /// Player experience at save time.
    pub experience: u32,

    /// Whether an encounter was in progress.
    pub combat_in_progress: bool,
}

impl SavedGame {
    /// Create a saved game from engine state.
    pub fn new(world: GameWorld, familiars: InMemoryFamiliars, inventory: InMemoryInventory) -> Self {
        let metadata = SaveMetadata {
            player_name: world.player.name.clone(),
            experience: world.player.experience,
            combat_in_progress: world.combat.is_some(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at: timestamp_now(),
            world,
            familiars,
            inventory,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path)?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read a save file's metadata without deserializing the full state.
    pub fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path)?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Create an auto-save file name for a player.
pub fn auto_save_path(base_dir: impl AsRef<Path>, player_name: &str) -> std::path::PathBuf {
    let sanitized = player_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}_autosave.json"))
}

fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    // Simple timestamp without a chrono dependency
    format!("{}", now.as_secs())
}
