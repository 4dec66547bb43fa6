//! Expression evaluator.
//!
//! Substitutes every recognized token of a formula with the current value
//! it names, computing the referenced stat first when needed, and then
//! evaluates the arithmetic that remains. A formula that still cannot be
//! evaluated comes back as its substituted text instead of failing the pass.

use crate::formula;
use crate::model::{EvaluationContext, TokenRef};
use crate::node::{Accumulator, EffectResult, NodeId};
use crate::scheduler::compute_stat;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("word pattern is valid"));

/// Format a value for substitution into formula text.
///
/// Negative values are parenthesized so they survive next to other
/// operators (`5 - (-3)`, `2 ^ (-1)`).
fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::from("NaN")
    } else if value.is_sign_negative() {
        format!("({value})")
    } else {
        value.to_string()
    }
}

/// Stats a formula reads, in order of first appearance.
///
/// Resolution follows the same rules as [`evaluate`] but nothing is
/// computed.
pub fn referenced_stats(ctx: &EvaluationContext, formula: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    for token in WORD.find_iter(formula) {
        if let Some(node) = ctx.resolve_token(token.as_str()).node() {
            if !found.contains(&node) {
                found.push(node);
            }
        }
    }
    found
}

fn substitute_token(ctx: &mut EvaluationContext, token: &str) -> String {
    match ctx.resolve_token(token) {
        TokenRef::Attribute(id) | TokenRef::Skill(id) | TokenRef::DamageMultiplier(id) => {
            compute_stat(ctx, id);
            format_number(ctx.node(id).result)
        }
        TokenRef::Modifier(id) => {
            compute_stat(ctx, id);
            match &ctx.node(id).accumulator {
                Accumulator::Attribute(att) => format_number(att.modifier.unwrap_or(f64::NAN)),
                _ => format_number(f64::NAN),
            }
        }
        TokenRef::ClassLevel(level) => format_number(level),
        TokenRef::TotalLevel => format_number(ctx.total_level()),
        TokenRef::Unresolved => token.to_string(),
    }
}

/// Substitute stat values into `formula` without evaluating it.
pub fn substitute(ctx: &mut EvaluationContext, formula: &str) -> String {
    WORD.replace_all(formula, |caps: &Captures| substitute_token(ctx, &caps[0]))
        .into_owned()
}

/// Evaluate a formula against the character.
///
/// Re-entrant: resolving a token may compute another stat, whose own
/// effects may evaluate formulas in turn.
///
/// # Examples
///
/// ```rust
/// use charstat::evaluator::evaluate;
/// use charstat::model::build;
/// use charstat::node::EffectResult;
/// use charstat::records::{AttributeRecord, CharacterRecords};
/// use charstat::{CharacterId, EngineConfig};
///
/// let records = CharacterRecords::new()
///     .with_attribute(AttributeRecord::ability("strength", 16.0))
///     .with_class_level("Fighter", 4.0);
/// let mut ctx = build(CharacterId::parse("c1").unwrap(), &records, EngineConfig::default());
///
/// assert_eq!(evaluate(&mut ctx, "strengthMod + 2"), EffectResult::Number(5.0));
/// assert_eq!(evaluate(&mut ctx, "fighterLevel * 2"), EffectResult::Number(8.0));
/// assert_eq!(
///     evaluate(&mut ctx, "strengthMod + rage"),
///     EffectResult::Text(String::from("3 + rage"))
/// );
/// ```
pub fn evaluate(ctx: &mut EvaluationContext, formula: &str) -> EffectResult {
    let substituted = substitute(ctx, formula);
    match formula::evaluate(&substituted) {
        Ok(value) => EffectResult::Number(value),
        Err(err) => {
            debug!(
                character = %ctx.character_id(),
                formula,
                substituted = %substituted,
                error = %err,
                "formula left unevaluated"
            );
            EffectResult::Text(substituted)
        }
    }
}
