//! Combiner.
//!
//! Closed-form rules that turn a stat's final accumulators into its
//! result. Skills read their ability modifier and the proficiency bonus,
//! so combining a skill may compute those stats first.

use crate::model::EvaluationContext;
use crate::node::{Accumulator, DamageAccumulator, NodeId};
use crate::records::AttributeType;
use crate::scheduler::compute_stat;

/// Clamp without panicking on inverted or `NaN` bounds.
///
/// A floor above the ceiling resolves to the ceiling.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let mut value = value;
    if value < min {
        value = min;
    }
    if value > max {
        value = max;
    }
    value
}

/// Proficiency bonus for a total character level when no
/// proficiency bonus skill overrides it.
///
/// # Examples
///
/// ```rust
/// use charstat::combine::default_proficiency_bonus;
///
/// assert_eq!(default_proficiency_bonus(1.0), 2.0);
/// assert_eq!(default_proficiency_bonus(5.0), 3.0);
/// assert_eq!(default_proficiency_bonus(17.0), 6.0);
/// ```
pub fn default_proficiency_bonus(total_level: f64) -> f64 {
    (total_level / 4.0 + 1.75).floor()
}

/// `floor((score - 10) / 2)`.
pub fn ability_modifier(score: f64) -> f64 {
    ((score - 10.0) / 2.0).floor()
}

/// Result of a damage multiplier from its marker counts.
///
/// Immunity wins; resistance and vulnerability cancel each other out.
pub fn damage_multiplier(acc: &DamageAccumulator) -> f64 {
    if acc.immunity_count > 0 {
        0.0
    } else if acc.resistance_count > 0 && acc.vulnerability_count > 0 {
        1.0
    } else if acc.resistance_count > 0 {
        0.5
    } else if acc.vulnerability_count > 0 {
        2.0
    } else {
        1.0
    }
}

fn combine_attribute(ctx: &mut EvaluationContext, id: NodeId) {
    let node = ctx.node_mut(id);
    let Accumulator::Attribute(acc) = &mut node.accumulator else {
        return;
    };
    let mut result = clamp((acc.base + acc.add) * acc.mul, acc.min, acc.max);
    if !acc.decimal {
        result = result.floor();
    }
    if acc.attribute_type == AttributeType::Ability {
        acc.modifier = Some(ability_modifier(result));
    }
    node.result = result;
}

fn combine_skill(ctx: &mut EvaluationContext, id: NodeId) {
    let node = ctx.node(id);
    let Accumulator::Skill(acc) = &node.accumulator else {
        return;
    };
    let proficiency_level = node.proficiency_level();
    let ability = acc
        .ability
        .as_ref()
        .and_then(|name| ctx.attribute(name.as_str()));

    let ability_modifier = match ability {
        Some(att) => {
            compute_stat(ctx, att);
            match &ctx.node(att).accumulator {
                Accumulator::Attribute(a) => a.modifier.unwrap_or(f64::NAN),
                _ => f64::NAN,
            }
        }
        None => 0.0,
    };

    let proficiency_bonus = match ctx.proficiency_bonus_skill() {
        Some(bonus) if bonus != id => {
            compute_stat(ctx, bonus);
            ctx.node(bonus).result
        }
        _ => default_proficiency_bonus(ctx.total_level()),
    };

    let node = ctx.node_mut(id);
    // Finalized as part of a cycle while its inputs were computed.
    if node.is_computed() {
        return;
    }
    let Accumulator::Skill(acc) = &mut node.accumulator else {
        return;
    };
    acc.proficiency_level = proficiency_level;
    let scaled_bonus = proficiency_bonus * proficiency_level;
    let result = clamp(
        (ability_modifier + scaled_bonus + acc.add) * acc.mul,
        acc.min,
        acc.max,
    );
    node.result = result.floor();
}

fn combine_damage_multiplier(ctx: &mut EvaluationContext, id: NodeId) {
    let node = ctx.node_mut(id);
    if let Accumulator::DamageMultiplier(acc) = &node.accumulator {
        node.result = damage_multiplier(acc);
    }
}

/// Produce the final result of a stat from its accumulators.
pub fn combine(ctx: &mut EvaluationContext, id: NodeId) {
    match ctx.node(id).accumulator {
        Accumulator::Attribute(_) => combine_attribute(ctx, id),
        Accumulator::Skill(_) => combine_skill(ctx, id),
        Accumulator::DamageMultiplier(_) => combine_damage_multiplier(ctx, id),
    }
}
