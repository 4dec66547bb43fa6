//! Identifier types.
//!
//! Provides `StatId`, the interned variable name a stat is addressed by
//! inside formulas and effect records, and `CharacterId`, the validated
//! identifier a recompute is requested for.

use crate::error::EngineError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned variable name of a stat.
///
/// Uses `Arc<str>` so the same name can be shared between records,
/// nodes, and results without reallocating.
///
/// # Examples
///
/// ```rust
/// use charstat::StatId;
///
/// let strength = StatId::from_str("strength");
/// let strength2: StatId = "strength".into();
///
/// assert_eq!(strength, strength2);
/// assert_eq!(strength.as_str(), "strength");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatId(Arc<str>);

impl Serialize for StatId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatId::from(s))
    }
}

impl StatId {
    /// Create a new `StatId` from a variable name.
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// The variable name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatId {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for StatId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::borrow::Borrow<str> for StatId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the character a recompute pass runs for.
///
/// Only non-empty ids made of ASCII letters, digits, `-` and `_` are
/// accepted. Anything else is rejected before the engine runs.
///
/// # Examples
///
/// ```rust
/// use charstat::CharacterId;
///
/// assert!(CharacterId::parse("aB3xK9").is_ok());
/// assert!(CharacterId::parse("").is_err());
/// assert!(CharacterId::parse("{$ne: null}").is_err());
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterId(Arc<str>);

impl CharacterId {
    /// Validate and wrap a raw character id.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        if raw.is_empty() {
            return Err(EngineError::InvalidInput(String::from(
                "character id is empty",
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(EngineError::InvalidInput(format!(
                "character id {raw:?} contains {bad:?}"
            )));
        }
        Ok(Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CharacterId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CharacterId> for String {
    fn from(id: CharacterId) -> Self {
        id.0.to_string()
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
