//! Write-back collaborator.
//!
//! Computed results leave the engine through [`StatSink`], one update at
//! a time. Updates carry no ordering or atomicity guarantee.

use crate::error::SinkError;
use crate::resolved::{AttributeUpdate, CharacterUpdate, DamageMultiplierUpdate, SkillUpdate};
use crate::stat_id::{CharacterId, StatId};
use std::collections::{HashMap, HashSet};

/// Persists computed results.
pub trait StatSink {
    fn write_attribute(
        &mut self,
        character: &CharacterId,
        update: &AttributeUpdate,
    ) -> Result<(), SinkError>;

    fn write_skill(
        &mut self,
        character: &CharacterId,
        update: &SkillUpdate,
    ) -> Result<(), SinkError>;

    fn write_damage_multiplier(
        &mut self,
        character: &CharacterId,
        update: &DamageMultiplierUpdate,
    ) -> Result<(), SinkError>;

    fn write_character(&mut self, update: &CharacterUpdate) -> Result<(), SinkError>;
}

/// A sink that keeps the latest update per stat in memory.
///
/// Stats registered with [`MemorySink::reject`] fail their writes, which
/// lets callers exercise partial write-back failures.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub attributes: HashMap<(CharacterId, StatId), AttributeUpdate>,
    pub skills: HashMap<(CharacterId, StatId), SkillUpdate>,
    pub damage_multipliers: HashMap<(CharacterId, StatId), DamageMultiplierUpdate>,
    pub characters: HashMap<CharacterId, CharacterUpdate>,
    rejected: HashSet<StatId>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write for `variable_name` fail.
    pub fn reject(&mut self, variable_name: impl Into<StatId>) {
        self.rejected.insert(variable_name.into());
    }

    fn check(&self, variable_name: &StatId) -> Result<(), SinkError> {
        if self.rejected.contains(variable_name) {
            return Err(SinkError::Rejected(
                variable_name.clone(),
                String::from("rejected by sink"),
            ));
        }
        Ok(())
    }

    /// Latest attribute update written for `character`.
    ///
    /// # Arguments
    ///
    /// * `character` - The character the update was written for
    /// * `name` - The attribute's variable name
    pub fn attribute(&self, character: &CharacterId, name: &str) -> Option<&AttributeUpdate> {
        self.attributes
            .get(&(character.clone(), StatId::from_str(name)))
    }

    /// Latest skill update written for `character`.
    pub fn skill(&self, character: &CharacterId, name: &str) -> Option<&SkillUpdate> {
        self.skills.get(&(character.clone(), StatId::from_str(name)))
    }

    /// Latest damage multiplier update written for `character`.
    pub fn damage_multiplier(
        &self,
        character: &CharacterId,
        name: &str,
    ) -> Option<&DamageMultiplierUpdate> {
        self.damage_multipliers
            .get(&(character.clone(), StatId::from_str(name)))
    }
}

impl StatSink for MemorySink {
    fn write_attribute(
        &mut self,
        character: &CharacterId,
        update: &AttributeUpdate,
    ) -> Result<(), SinkError> {
        self.check(&update.variable_name)?;
        self.attributes.insert(
            (character.clone(), update.variable_name.clone()),
            update.clone(),
        );
        Ok(())
    }

    fn write_skill(
        &mut self,
        character: &CharacterId,
        update: &SkillUpdate,
    ) -> Result<(), SinkError> {
        self.check(&update.variable_name)?;
        self.skills.insert(
            (character.clone(), update.variable_name.clone()),
            update.clone(),
        );
        Ok(())
    }

    fn write_damage_multiplier(
        &mut self,
        character: &CharacterId,
        update: &DamageMultiplierUpdate,
    ) -> Result<(), SinkError> {
        self.check(&update.variable_name)?;
        self.damage_multipliers.insert(
            (character.clone(), update.variable_name.clone()),
            update.clone(),
        );
        Ok(())
    }

    fn write_character(&mut self, update: &CharacterUpdate) -> Result<(), SinkError> {
        self.characters
            .insert(update.character_id.clone(), update.clone());
        Ok(())
    }
}
