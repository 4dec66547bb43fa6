//! Stat and effect nodes.
//!
//! Nodes live in the arena owned by [`EvaluationContext`](crate::model::EvaluationContext)
//! and refer to each other by index. Each stat node carries a tri-state
//! [`StatState`] and a per-kind [`Accumulator`] that effects fold into.

use crate::records::{AttributeType, Operation};
use crate::stat_id::StatId;
use serde::{Deserialize, Serialize};

/// Index of a stat node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of an effect node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub usize);

/// Computation state of a stat within one recompute pass.
///
/// Moves `Uncomputed → InProgress → Computed` and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatState {
    #[default]
    Uncomputed,
    InProgress,
    Computed,
}

/// The three kinds of stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Attribute,
    Skill,
    DamageMultiplier,
}

/// Result of evaluating an effect.
///
/// Formulas that cannot be evaluated keep their substituted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectResult {
    Number(f64),
    Text(String),
}

impl EffectResult {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EffectResult::Number(n) => Some(*n),
            EffectResult::Text(_) => None,
        }
    }
}

impl std::fmt::Display for EffectResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectResult::Number(n) => write!(f, "{n}"),
            EffectResult::Text(text) => f.write_str(text),
        }
    }
}

/// Where an effect's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectSource {
    Value(f64),
    Calculation(String),
    /// Neither a value nor a calculation was stored.
    Empty,
}

#[derive(Debug, Clone)]
pub struct EffectNode {
    pub target: NodeId,
    pub operation: Operation,
    pub source: EffectSource,
    /// Memoized once per pass.
    pub result: Option<EffectResult>,
}

/// Accumulators for an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAccumulator {
    pub base: f64,
    pub add: f64,
    pub mul: f64,
    pub min: f64,
    pub max: f64,
    pub decimal: bool,
    pub attribute_type: AttributeType,
    /// Set by the combiner for abilities only.
    pub modifier: Option<f64>,
}

impl AttributeAccumulator {
    pub fn new(base: f64, decimal: bool, attribute_type: AttributeType) -> Self {
        Self {
            base,
            add: 0.0,
            mul: 1.0,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            decimal,
            attribute_type,
            modifier: None,
        }
    }
}

/// Accumulators for a skill or save.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillAccumulator {
    pub add: f64,
    pub mul: f64,
    pub min: f64,
    pub max: f64,
    pub proficiency_level: f64,
    pub advantage_count: u32,
    pub disadvantage_count: u32,
    pub passive_add: f64,
    pub fail_count: u32,
    pub conditional_count: u32,
    pub ability: Option<StatId>,
}

impl SkillAccumulator {
    pub fn new(ability: Option<StatId>) -> Self {
        Self {
            add: 0.0,
            mul: 1.0,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            proficiency_level: 0.0,
            advantage_count: 0,
            disadvantage_count: 0,
            passive_add: 0.0,
            fail_count: 0,
            conditional_count: 0,
            ability,
        }
    }
}

/// Marker counts for a damage multiplier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageAccumulator {
    pub immunity_count: u32,
    pub resistance_count: u32,
    pub vulnerability_count: u32,
}

/// Per-kind accumulator state.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Attribute(AttributeAccumulator),
    Skill(SkillAccumulator),
    DamageMultiplier(DamageAccumulator),
}

impl Accumulator {
    pub fn kind(&self) -> StatKind {
        match self {
            Accumulator::Attribute(_) => StatKind::Attribute,
            Accumulator::Skill(_) => StatKind::Skill,
            Accumulator::DamageMultiplier(_) => StatKind::DamageMultiplier,
        }
    }

    /// Fold one effect result into the accumulators.
    ///
    /// Operations that mean nothing for this kind are ignored, as are text
    /// results for operations that need a number.
    pub fn apply(&mut self, operation: Operation, result: &EffectResult) {
        let value = result.as_number();
        match self {
            Accumulator::Attribute(acc) => match (operation, value) {
                (Operation::Base, Some(v)) => {
                    if v > acc.base {
                        acc.base = v;
                    }
                }
                (Operation::Add, Some(v)) => acc.add += v,
                (Operation::Mul, Some(v)) => acc.mul *= v,
                (Operation::Min, Some(v)) => {
                    if v > acc.min {
                        acc.min = v;
                    }
                }
                (Operation::Max, Some(v)) => {
                    if v < acc.max {
                        acc.max = v;
                    }
                }
                _ => {}
            },
            Accumulator::Skill(acc) => match (operation, value) {
                (Operation::Add, Some(v)) => acc.add += v,
                (Operation::Mul, Some(v)) => acc.mul *= v,
                (Operation::Min, Some(v)) => {
                    if v > acc.min {
                        acc.min = v;
                    }
                }
                (Operation::Max, Some(v)) => {
                    if v < acc.max {
                        acc.max = v;
                    }
                }
                (Operation::PassiveAdd, Some(v)) => acc.passive_add += v,
                (Operation::Advantage, _) => acc.advantage_count += 1,
                (Operation::Disadvantage, _) => acc.disadvantage_count += 1,
                (Operation::Fail, _) => acc.fail_count += 1,
                (Operation::Conditional, _) => acc.conditional_count += 1,
                _ => {}
            },
            Accumulator::DamageMultiplier(acc) => {
                if let (Operation::Mul, Some(v)) = (operation, value) {
                    if v == 0.0 {
                        acc.immunity_count += 1;
                    } else if v > 0.0 && v < 1.0 {
                        acc.resistance_count += 1;
                    } else if v > 1.0 {
                        acc.vulnerability_count += 1;
                    }
                }
            }
        }
    }
}

/// One stat in the arena.
#[derive(Debug, Clone)]
pub struct StatNode {
    pub id: StatId,
    pub state: StatState,
    /// Numeric or `NaN`; meaningful once `state` is `Computed`.
    pub result: f64,
    pub effects: Vec<EffectId>,
    /// Levels of the proficiencies attached to a skill.
    pub proficiencies: Vec<f64>,
    pub accumulator: Accumulator,
}

impl StatNode {
    pub fn new(id: StatId, accumulator: Accumulator) -> Self {
        Self {
            id,
            state: StatState::Uncomputed,
            result: 0.0,
            effects: Vec::new(),
            proficiencies: Vec::new(),
            accumulator,
        }
    }

    pub fn kind(&self) -> StatKind {
        self.accumulator.kind()
    }

    pub fn is_computed(&self) -> bool {
        self.state == StatState::Computed
    }

    /// Highest level among the attached proficiencies, `0` if none.
    pub fn proficiency_level(&self) -> f64 {
        self.proficiencies.iter().copied().fold(0.0, f64::max)
    }

    /// Terminal state for a stat caught in a dependency cycle.
    ///
    /// Only the computed values become `NaN`; a skill still reports the
    /// proficiency level its records give it.
    pub fn break_cycle(&mut self) {
        self.state = StatState::Computed;
        self.result = f64::NAN;
        let proficiency_level = self.proficiency_level();
        match &mut self.accumulator {
            Accumulator::Attribute(acc) if acc.attribute_type == AttributeType::Ability => {
                acc.modifier = Some(f64::NAN);
            }
            Accumulator::Skill(acc) => acc.proficiency_level = proficiency_level,
            _ => {}
        }
    }
}
