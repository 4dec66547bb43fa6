//! Graph evaluator.
//!
//! Computes stats lazily and at most once per pass. A stat first computes
//! its effects, which may pull in other stats through their formulas,
//! then hands its accumulators to the combiner. Re-entering a stat that is
//! still in progress means a dependency cycle; the stat is finalized as
//! `NaN` on the spot so the recursion always terminates.

use crate::combine::combine;
use crate::evaluator::evaluate;
use crate::model::EvaluationContext;
use crate::node::{EffectId, EffectResult, EffectSource, NodeId, StatState};
use crate::records::Operation;
use tracing::{debug, trace};

/// Compute the result of one effect, memoized for the pass.
pub fn compute_effect(ctx: &mut EvaluationContext, id: EffectId) -> EffectResult {
    if let Some(result) = &ctx.effects[id.0].result {
        return result.clone();
    }
    let effect = &ctx.effects[id.0];
    let result = match (effect.operation, &effect.source) {
        (_, EffectSource::Value(value)) => EffectResult::Number(*value),
        (Operation::Conditional, EffectSource::Calculation(text)) => {
            EffectResult::Text(text.clone())
        }
        (_, EffectSource::Calculation(formula)) => {
            let formula = formula.clone();
            evaluate(ctx, &formula)
        }
        (_, EffectSource::Empty) => EffectResult::Text(String::new()),
    };
    ctx.effects[id.0].result = Some(result.clone());
    result
}

/// Compute one stat and, recursively, everything it reads.
///
/// Calling this on a computed stat does nothing.
pub fn compute_stat(ctx: &mut EvaluationContext, id: NodeId) {
    match ctx.node(id).state {
        StatState::Computed => return,
        StatState::InProgress => {
            debug!(
                character = %ctx.character_id(),
                stat = %ctx.node(id).id,
                "dependency cycle re-entered, stat set to NaN"
            );
            ctx.node_mut(id).break_cycle();
            return;
        }
        StatState::Uncomputed => {}
    }

    ctx.node_mut(id).state = StatState::InProgress;

    let effects = ctx.node(id).effects.clone();
    for effect in effects {
        let result = compute_effect(ctx, effect);
        // A cycle through this stat finalized it while the effect ran.
        if ctx.node(id).is_computed() {
            return;
        }
        let operation = ctx.effect(effect).operation;
        ctx.node_mut(id).accumulator.apply(operation, &result);
    }

    combine(ctx, id);
    if ctx.node(id).is_computed() {
        return;
    }

    let node = ctx.node_mut(id);
    node.state = StatState::Computed;
    trace!(stat = %node.id, kind = ?node.kind(), result = node.result, "stat computed");
}

/// Finalize every stat that belongs to a reference cycle as `NaN`.
///
/// Runs before any evaluation so stats reading a cyclic stat always see
/// `NaN`, whichever stat the pass happens to visit first.
pub fn break_cycles(ctx: &mut EvaluationContext) {
    for cycle in ctx.references.cycles() {
        debug!(
            character = %ctx.character_id(),
            cycle = %cycle,
            "dependency cycle detected"
        );
        for node in cycle.nodes {
            if !ctx.node(node).is_computed() {
                ctx.node_mut(node).break_cycle();
            }
        }
    }
}

/// Compute every stat of the character.
///
/// # Examples
///
/// ```rust
/// use charstat::model::build;
/// use charstat::records::{AttributeRecord, CharacterRecords, EffectRecord, Operation};
/// use charstat::scheduler::compute_all;
/// use charstat::{CharacterId, EngineConfig};
///
/// let records = CharacterRecords::new()
///     .with_attribute(AttributeRecord::new("armor", 10.0))
///     .with_attribute(AttributeRecord::ability("dexterity", 14.0))
///     .with_effect(EffectRecord::calculation("armor", Operation::Add, "dexterityMod"));
/// let mut ctx = build(CharacterId::parse("c1").unwrap(), &records, EngineConfig::default());
///
/// compute_all(&mut ctx);
///
/// let armor = ctx.attribute("armor").unwrap();
/// assert_eq!(ctx.node(armor).result, 12.0);
/// ```
pub fn compute_all(ctx: &mut EvaluationContext) {
    break_cycles(ctx);
    for index in 0..ctx.nodes.len() {
        compute_stat(ctx, NodeId(index));
    }
}
