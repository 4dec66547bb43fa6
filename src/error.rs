//! Error types.
//!
//! Conditions inside a single character's computation (cycles, missing
//! targets, unparseable formulas) are recovered from and never show up
//! here. These types cover the edges of the engine: caller input, the
//! storage collaborator, the write-back collaborator, and the formula
//! parser whose errors the evaluator turns into text results.

use crate::stat_id::{CharacterId, StatId};
use thiserror::Error;

/// Errors returned by [`Engine::recompute`](crate::Engine::recompute).
///
/// # Examples
///
/// ```rust
/// use charstat::EngineError;
///
/// let err = EngineError::InvalidInput(String::from("character id is empty"));
/// assert_eq!(err.to_string(), "Invalid input: character id is empty");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The caller supplied a malformed identifier.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The raw records could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by a [`CharacterStore`](crate::store::CharacterStore).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    /// Stored records did not match the expected shape.
    #[error("Malformed records for character {0}: {1}")]
    Malformed(CharacterId, String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Errors raised by a [`StatSink`](crate::sink::StatSink) for a single update.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SinkError {
    /// The sink refused the update for this stat.
    #[error("Update rejected for {0}: {1}")]
    Rejected(StatId, String),

    #[error("Write-back backend failure: {0}")]
    Backend(String),
}

/// Errors produced while lexing, parsing, or evaluating an arithmetic formula.
///
/// Positions are byte offsets into the formula text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Unexpected character {1:?} at {0}")]
    UnexpectedChar(usize, char),

    #[error("Unexpected token {1:?} at {0}")]
    UnexpectedToken(usize, String),

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("Function {name} expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// An identifier that is neither a constant nor a function call.
    #[error("Unresolved identifier: {0}")]
    UnresolvedIdentifier(String),

    /// Nesting exceeds the given number of levels.
    #[error("Formula nested deeper than {0} levels")]
    TooDeep(usize),
}
