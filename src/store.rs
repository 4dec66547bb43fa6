//! Storage collaborator.
//!
//! The engine reads all raw records of a character through
//! [`CharacterStore`]. Implementations must hand back one consistent
//! point-in-time snapshot; the engine does not guard against records
//! changing mid-read.

use crate::error::StoreError;
use crate::records::CharacterRecords;
use crate::stat_id::CharacterId;
use std::collections::HashMap;

/// Read access to a character's raw records.
pub trait CharacterStore {
    /// Load every record of `id`. Only enabled effects and proficiencies
    /// need to be returned.
    fn load(&self, id: &CharacterId) -> Result<CharacterRecords, StoreError>;
}

/// A store backed by a `HashMap`.
///
/// # Examples
///
/// ```rust
/// use charstat::store::{CharacterStore, MemoryStore};
/// use charstat::CharacterId;
///
/// let id = CharacterId::parse("hero").unwrap();
/// let mut store = MemoryStore::new();
/// store
///     .insert_json(id.clone(), r#"{ "classLevels": [{ "name": "Bard", "level": 2 }] }"#)
///     .unwrap();
///
/// assert_eq!(store.load(&id).unwrap().class_levels.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    characters: HashMap<CharacterId, CharacterRecords>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CharacterId, records: CharacterRecords) {
        self.characters.insert(id, records);
    }

    /// Insert records decoded from a JSON document.
    pub fn insert_json(&mut self, id: CharacterId, json: &str) -> Result<(), StoreError> {
        let records = CharacterRecords::from_json(json)
            .map_err(|err| StoreError::Malformed(id.clone(), err.to_string()))?;
        self.insert(id, records);
        Ok(())
    }
}

impl CharacterStore for MemoryStore {
    fn load(&self, id: &CharacterId) -> Result<CharacterRecords, StoreError> {
        self.characters
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::CharacterNotFound(id.clone()))
    }
}
