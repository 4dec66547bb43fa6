//! Raw input records.
//!
//! These are the shapes the storage collaborator hands to the engine for
//! one character. The engine only reads them; computed values travel back
//! through [`resolved`](crate::resolved) instead.

use crate::stat_id::StatId;
use serde::{Deserialize, Serialize};

/// The operation an effect contributes to its target stat.
///
/// Serialized in camelCase (`"passiveAdd"`), matching stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Keeps the highest base value seen.
    Base,
    Add,
    Mul,
    /// Raises the lower clamp bound (highest floor wins).
    Min,
    /// Lowers the upper clamp bound (lowest ceiling wins).
    Max,
    Advantage,
    Disadvantage,
    PassiveAdd,
    Fail,
    Conditional,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Base => "base",
            Operation::Add => "add",
            Operation::Mul => "mul",
            Operation::Min => "min",
            Operation::Max => "max",
            Operation::Advantage => "advantage",
            Operation::Disadvantage => "disadvantage",
            Operation::PassiveAdd => "passiveAdd",
            Operation::Fail => "fail",
            Operation::Conditional => "conditional",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an attribute. Only `Ability` changes how it is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    /// Ability scores derive a modifier.
    Ability,
    Stat,
    Modifier,
    HitDice,
    HealthBar,
    Resource,
    SpellSlot,
    #[default]
    Utility,
    #[serde(other)]
    Other,
}

/// What a proficiency record applies to. Only `Skill` and `Save` reach stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProficiencyKind {
    #[default]
    Skill,
    Save,
    Weapon,
    Armor,
    Tool,
    Language,
    #[serde(other)]
    Other,
}

impl ProficiencyKind {
    pub fn targets_skill(self) -> bool {
        matches!(self, ProficiencyKind::Skill | ProficiencyKind::Save)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRecord {
    pub variable_name: StatId,
    #[serde(default)]
    pub base_value: f64,
    /// Keeps fractional results instead of flooring them.
    #[serde(default)]
    pub decimal: bool,
    #[serde(default)]
    pub attribute_type: AttributeType,
}

impl AttributeRecord {
    pub fn new(variable_name: impl Into<StatId>, base_value: f64) -> Self {
        Self {
            variable_name: variable_name.into(),
            base_value,
            decimal: false,
            attribute_type: AttributeType::Utility,
        }
    }

    /// An ability score, which derives a modifier.
    pub fn ability(variable_name: impl Into<StatId>, base_value: f64) -> Self {
        Self {
            attribute_type: AttributeType::Ability,
            ..Self::new(variable_name, base_value)
        }
    }

    pub fn decimal(mut self) -> Self {
        self.decimal = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub variable_name: StatId,
    /// Variable name of the attribute whose modifier the skill is based on.
    #[serde(default)]
    pub ability: Option<StatId>,
}

impl SkillRecord {
    pub fn new(variable_name: impl Into<StatId>, ability: Option<&str>) -> Self {
        Self {
            variable_name: variable_name.into(),
            ability: ability.map(StatId::from_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageMultiplierRecord {
    pub variable_name: StatId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLevelRecord {
    pub name: String,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectRecord {
    pub target_variable_name: StatId,
    pub operation: Operation,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub calculation: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl EffectRecord {
    pub fn value(target: impl Into<StatId>, operation: Operation, value: f64) -> Self {
        Self {
            target_variable_name: target.into(),
            operation,
            value: Some(value),
            calculation: None,
            enabled: true,
        }
    }

    pub fn calculation(
        target: impl Into<StatId>,
        operation: Operation,
        calculation: impl Into<String>,
    ) -> Self {
        Self {
            target_variable_name: target.into(),
            operation,
            value: None,
            calculation: Some(calculation.into()),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyRecord {
    pub target_name: StatId,
    pub level: f64,
    #[serde(default, rename = "type")]
    pub kind: ProficiencyKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl ProficiencyRecord {
    pub fn new(target_name: impl Into<StatId>, level: f64) -> Self {
        Self {
            target_name: target_name.into(),
            level,
            kind: ProficiencyKind::Skill,
            enabled: true,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Every raw record read for one character, taken from a single
/// point-in-time snapshot of storage.
///
/// # Examples
///
/// ```rust
/// use charstat::records::CharacterRecords;
///
/// let records = CharacterRecords::from_json(r#"{
///     "attributes": [
///         { "variableName": "strength", "baseValue": 16, "attributeType": "ability" }
///     ],
///     "effects": [
///         { "targetVariableName": "strength", "operation": "add", "value": 2 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(records.attributes.len(), 1);
/// assert_eq!(records.effects.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterRecords {
    pub attributes: Vec<AttributeRecord>,
    pub skills: Vec<SkillRecord>,
    pub damage_multipliers: Vec<DamageMultiplierRecord>,
    pub class_levels: Vec<ClassLevelRecord>,
    pub effects: Vec<EffectRecord>,
    pub proficiencies: Vec<ProficiencyRecord>,
}

impl CharacterRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_attribute(mut self, record: AttributeRecord) -> Self {
        self.attributes.push(record);
        self
    }

    pub fn with_skill(mut self, record: SkillRecord) -> Self {
        self.skills.push(record);
        self
    }

    pub fn with_damage_multiplier(mut self, variable_name: impl Into<StatId>) -> Self {
        self.damage_multipliers.push(DamageMultiplierRecord {
            variable_name: variable_name.into(),
        });
        self
    }

    pub fn with_class_level(mut self, name: impl Into<String>, level: f64) -> Self {
        self.class_levels.push(ClassLevelRecord {
            name: name.into(),
            level,
        });
        self
    }

    pub fn with_effect(mut self, record: EffectRecord) -> Self {
        self.effects.push(record);
        self
    }

    pub fn with_proficiency(mut self, record: ProficiencyRecord) -> Self {
        self.proficiencies.push(record);
        self
    }
}
