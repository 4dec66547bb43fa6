//! Engine facade.
//!
//! [`Engine`] is the entry point callers use: `compute` runs one pass
//! over records already in hand, `recompute` reads them from a store,
//! computes, and writes the results back.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::build;
use crate::records::CharacterRecords;
use crate::resolved::{ComputedCharacter, WriteReport};
use crate::scheduler::compute_all;
use crate::sink::StatSink;
use crate::stat_id::CharacterId;
use crate::store::CharacterStore;
use tracing::{debug, instrument};

/// Result of [`Engine::recompute`].
#[derive(Debug, Clone)]
pub struct Recomputed {
    pub character: ComputedCharacter,
    pub report: WriteReport,
}

/// Stat computation engine.
///
/// Holds no per-character state: every call builds its own node graph
/// and drops it when done, so one engine can serve many characters
/// concurrently.
///
/// # Examples
///
/// ```rust
/// use charstat::records::{
///     AttributeRecord, CharacterRecords, EffectRecord, Operation, ProficiencyRecord, SkillRecord,
/// };
/// use charstat::{CharacterId, Engine};
///
/// let records = CharacterRecords::new()
///     .with_attribute(AttributeRecord::ability("strength", 15.0))
///     .with_skill(SkillRecord::new("athletics", Some("strength")))
///     .with_proficiency(ProficiencyRecord::new("athletics", 1.0))
///     .with_effect(EffectRecord::value("strength", Operation::Add, 2.0))
///     .with_class_level("Barbarian", 4.0);
///
/// let engine = Engine::new();
/// let computed = engine.compute(CharacterId::parse("grog").unwrap(), &records);
///
/// let strength = computed.attribute("strength").unwrap();
/// assert_eq!(strength.result, 17.0);
/// assert_eq!(strength.modifier, Some(3.0));
/// // 3 (strength) + 2 (proficiency bonus at level 4)
/// assert_eq!(computed.skill("athletics").unwrap().result, 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute every stat of one character from its raw records.
    pub fn compute(&self, character_id: CharacterId, records: &CharacterRecords) -> ComputedCharacter {
        let mut ctx = build(character_id, records, self.config.clone());
        compute_all(&mut ctx);
        ComputedCharacter::from_context(&ctx)
    }

    /// Recompute a character end to end: validate the id, load its
    /// records, compute, and write every result to `sink`.
    ///
    /// Write-back failures do not fail the call; they are listed in the
    /// returned report.
    #[instrument(skip(self, store, sink))]
    pub fn recompute(
        &self,
        store: &dyn CharacterStore,
        sink: &mut dyn StatSink,
        character_id: &str,
    ) -> Result<Recomputed, EngineError> {
        let id = CharacterId::parse(character_id)?;

        let records = store.load(&id)?;
        debug!(
            attributes = records.attributes.len(),
            skills = records.skills.len(),
            damage_multipliers = records.damage_multipliers.len(),
            effects = records.effects.len(),
            proficiencies = records.proficiencies.len(),
            "records loaded"
        );

        let character = self.compute(id, &records);
        let report = character.write_to(sink);
        debug!(
            written = report.written,
            failed = report.failed.len(),
            "results written back"
        );

        Ok(Recomputed { character, report })
    }
}
