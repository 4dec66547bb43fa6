//! Computed results.
//!
//! `ComputedCharacter` is the in-memory result set of one recompute pass:
//! the per-kind updates destined for the write-back sink, plus a breakdown
//! of which effects fed each stat and the cycles that were broken.

use crate::error::SinkError;
use crate::graph::Cycle;
use crate::model::EvaluationContext;
use crate::node::{Accumulator, EffectResult, StatKind};
use crate::records::Operation;
use crate::sink::StatSink;
use crate::stat_id::{CharacterId, StatId};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeUpdate {
    pub variable_name: StatId,
    pub result: f64,
    /// Present for abilities only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillUpdate {
    pub variable_name: StatId,
    pub result: f64,
    pub advantage_count: u32,
    pub disadvantage_count: u32,
    pub passive_add: f64,
    pub proficiency_level: f64,
    pub conditional_count: u32,
    pub fail_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageMultiplierUpdate {
    pub variable_name: StatId,
    pub result: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterUpdate {
    pub character_id: CharacterId,
    pub total_level: f64,
}

/// One effect as it was applied to a stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub operation: Operation,
    pub result: EffectResult,
}

/// The effects that contributed to one stat, in input order.
///
/// Effects of a stat caught in a cycle are never evaluated and do not
/// appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBreakdown {
    pub kind: StatKind,
    pub variable_name: StatId,
    pub effects: Vec<AppliedEffect>,
}

impl StatBreakdown {
    pub fn new(kind: StatKind, variable_name: StatId) -> Self {
        Self {
            kind,
            variable_name,
            effects: Vec::new(),
        }
    }

    pub fn add_effect(&mut self, operation: Operation, result: EffectResult) {
        self.effects.push(AppliedEffect { operation, result });
    }
}

/// Outcome of writing a result set back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub written: usize,
    pub failed: Vec<SinkError>,
}

impl WriteReport {
    /// True if every update was accepted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: Result<(), SinkError>) {
        match outcome {
            Ok(()) => self.written += 1,
            Err(err) => {
                warn!(error = %err, "write-back update failed");
                self.failed.push(err);
            }
        }
    }
}

/// Complete result set of one recompute pass.
///
/// Every list is sorted by variable name, so the result does not depend
/// on the order records were read in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedCharacter {
    pub character: CharacterUpdate,
    pub attributes: Vec<AttributeUpdate>,
    pub skills: Vec<SkillUpdate>,
    pub damage_multipliers: Vec<DamageMultiplierUpdate>,
    pub breakdown: Vec<StatBreakdown>,
    /// Member names of every dependency cycle that was broken.
    pub cycles: Vec<Vec<StatId>>,
}

impl ComputedCharacter {
    /// Collect results from a fully computed context.
    pub fn from_context(ctx: &EvaluationContext) -> Self {
        let mut attributes = Vec::new();
        let mut skills = Vec::new();
        let mut damage_multipliers = Vec::new();
        let mut breakdown = Vec::new();

        for node in ctx.nodes() {
            let variable_name = node.id.clone();
            match &node.accumulator {
                Accumulator::Attribute(acc) => attributes.push(AttributeUpdate {
                    variable_name: variable_name.clone(),
                    result: node.result,
                    modifier: acc.modifier,
                }),
                Accumulator::Skill(acc) => skills.push(SkillUpdate {
                    variable_name: variable_name.clone(),
                    result: node.result,
                    advantage_count: acc.advantage_count,
                    disadvantage_count: acc.disadvantage_count,
                    passive_add: acc.passive_add,
                    proficiency_level: acc.proficiency_level,
                    conditional_count: acc.conditional_count,
                    fail_count: acc.fail_count,
                }),
                Accumulator::DamageMultiplier(_) => {
                    damage_multipliers.push(DamageMultiplierUpdate {
                        variable_name: variable_name.clone(),
                        result: node.result,
                    })
                }
            }

            let mut stat = StatBreakdown::new(node.kind(), variable_name);
            for &effect in &node.effects {
                let effect = ctx.effect(effect);
                if let Some(result) = &effect.result {
                    stat.add_effect(effect.operation, result.clone());
                }
            }
            breakdown.push(stat);
        }

        attributes.sort_by(|a, b| a.variable_name.cmp(&b.variable_name));
        skills.sort_by(|a, b| a.variable_name.cmp(&b.variable_name));
        damage_multipliers.sort_by(|a, b| a.variable_name.cmp(&b.variable_name));
        breakdown.sort_by(|a, b| (a.kind, &a.variable_name).cmp(&(b.kind, &b.variable_name)));

        let mut cycles: Vec<Vec<StatId>> = ctx
            .references()
            .cycles()
            .into_iter()
            .map(|cycle: Cycle| {
                let mut names = cycle.stats;
                names.sort();
                names
            })
            .collect();
        cycles.sort();

        Self {
            character: CharacterUpdate {
                character_id: ctx.character_id().clone(),
                total_level: ctx.total_level(),
            },
            attributes,
            skills,
            damage_multipliers,
            breakdown,
            cycles,
        }
    }

    /// Character these results belong to.
    pub fn character_id(&self) -> &CharacterId {
        &self.character.character_id
    }

    pub fn total_level(&self) -> f64 {
        self.character.total_level
    }

    /// Find an attribute's result by variable name.
    ///
    /// # Arguments
    ///
    /// * `name` - The attribute's variable name
    ///
    /// # Returns
    ///
    /// The attribute's update, or `None` if the character has no such
    /// attribute.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::records::{AttributeRecord, CharacterRecords};
    /// use charstat::{CharacterId, Engine};
    ///
    /// let records = CharacterRecords::new().with_attribute(AttributeRecord::ability("wisdom", 8.0));
    /// let computed = Engine::new().compute(CharacterId::parse("c1").unwrap(), &records);
    ///
    /// assert_eq!(computed.attribute("wisdom").unwrap().modifier, Some(-1.0));
    /// assert!(computed.attribute("charisma").is_none());
    /// ```
    pub fn attribute(&self, name: &str) -> Option<&AttributeUpdate> {
        self.attributes
            .iter()
            .find(|a| a.variable_name.as_str() == name)
    }

    /// Find a skill's result by variable name.
    pub fn skill(&self, name: &str) -> Option<&SkillUpdate> {
        self.skills.iter().find(|s| s.variable_name.as_str() == name)
    }

    /// Find a damage multiplier's result by variable name.
    pub fn damage_multiplier(&self, name: &str) -> Option<&DamageMultiplierUpdate> {
        self.damage_multipliers
            .iter()
            .find(|d| d.variable_name.as_str() == name)
    }

    /// Get the effects applied to one stat.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which namespace `name` lives in
    /// * `name` - The stat's variable name
    pub fn breakdown(&self, kind: StatKind, name: &str) -> Option<&StatBreakdown> {
        self.breakdown
            .iter()
            .find(|b| b.kind == kind && b.variable_name.as_str() == name)
    }

    /// Send every update to `sink`.
    ///
    /// Updates are independent: a rejected update is logged and recorded
    /// in the report, and the rest are still sent.
    pub fn write_to(&self, sink: &mut dyn StatSink) -> WriteReport {
        let id = self.character_id();
        let mut report = WriteReport::default();
        for update in &self.attributes {
            report.record(sink.write_attribute(id, update));
        }
        for update in &self.skills {
            report.record(sink.write_skill(id, update));
        }
        for update in &self.damage_multipliers {
            report.record(sink.write_damage_multiplier(id, update));
        }
        report.record(sink.write_character(&self.character));
        report
    }
}
