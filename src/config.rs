//! Engine configuration.
//!
//! The engine interprets a handful of conventions inside formulas and
//! combination rules. `EngineConfig` names them so hosts with different
//! document conventions can override them without touching the engine.

use serde::{Deserialize, Serialize};

/// Conventions used while evaluating a character.
///
/// Missing fields fall back to their defaults when deserializing.
///
/// # Examples
///
/// ```rust
/// use charstat::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.modifier_suffix, "mod");
/// assert_eq!(config.proficiency_bonus_variable, "proficiencyBonus");
///
/// let custom = EngineConfig::from_json(r#"{ "modifierSuffix": "Modifier" }"#).unwrap();
/// assert_eq!(custom.modifier_suffix, "Modifier");
/// assert_eq!(custom.proficiency_bonus_variable, "proficiencyBonus");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Token suffix that selects an ability's modifier (`strengthMod`).
    /// Matched case-insensitively.
    pub modifier_suffix: String,

    /// Variable name of the skill that overrides the level-based
    /// proficiency bonus when a character defines it.
    pub proficiency_bonus_variable: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            modifier_suffix: String::from("mod"),
            proficiency_bonus_variable: String::from("proficiencyBonus"),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Strip the modifier suffix from `token`, ignoring case.
    ///
    /// Returns `None` if the token does not end with the suffix or is
    /// nothing but the suffix.
    pub fn strip_modifier_suffix<'a>(&self, token: &'a str) -> Option<&'a str> {
        let suffix_len = self.modifier_suffix.len();
        if suffix_len == 0 || token.len() <= suffix_len {
            return None;
        }
        let split = token.len() - suffix_len;
        if !token.is_char_boundary(split) {
            return None;
        }
        let (base, suffix) = token.split_at(split);
        suffix
            .eq_ignore_ascii_case(&self.modifier_suffix)
            .then_some(base)
    }
}
