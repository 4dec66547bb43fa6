//! Character model builder.
//!
//! Turns the raw records of one character into the node arena the
//! scheduler works on. Effects and proficiencies are attached to the stat
//! they target here; ones whose target does not exist are dropped.

use crate::config::EngineConfig;
use crate::evaluator::referenced_stats;
use crate::graph::ReferenceGraph;
use crate::node::{
    Accumulator, AttributeAccumulator, DamageAccumulator, EffectId, EffectNode, EffectSource,
    NodeId, SkillAccumulator, StatKind, StatNode,
};
use crate::records::{CharacterRecords, EffectRecord, Operation};
use crate::stat_id::{CharacterId, StatId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

static CLASS_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([A-Za-z0-9_]+?)levels?$").expect("class level pattern is valid")
});

/// What a formula token refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenRef {
    Attribute(NodeId),
    /// The derived modifier of an attribute.
    Modifier(NodeId),
    Skill(NodeId),
    DamageMultiplier(NodeId),
    ClassLevel(f64),
    TotalLevel,
    Unresolved,
}

impl TokenRef {
    /// The stat node the token reads, if any.
    pub fn node(self) -> Option<NodeId> {
        match self {
            TokenRef::Attribute(id)
            | TokenRef::Modifier(id)
            | TokenRef::Skill(id)
            | TokenRef::DamageMultiplier(id) => Some(id),
            TokenRef::ClassLevel(_) | TokenRef::TotalLevel | TokenRef::Unresolved => None,
        }
    }
}

/// All state of one recompute pass.
///
/// Owns the node arena, the class levels, and the reference graph.
/// Built fresh by [`build`] for every pass and dropped afterwards.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub(crate) character_id: CharacterId,
    pub(crate) config: EngineConfig,
    pub(crate) total_level: f64,
    /// Keyed by lowercased class name.
    pub(crate) class_levels: HashMap<String, f64>,
    pub(crate) nodes: Vec<StatNode>,
    pub(crate) effects: Vec<EffectNode>,
    pub(crate) attributes: HashMap<StatId, NodeId>,
    pub(crate) skills: HashMap<StatId, NodeId>,
    pub(crate) damage_multipliers: HashMap<StatId, NodeId>,
    pub(crate) references: ReferenceGraph,
}

impl EvaluationContext {
    /// Character this pass computes.
    pub fn character_id(&self) -> &CharacterId {
        &self.character_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sum of all class levels.
    pub fn total_level(&self) -> f64 {
        self.total_level
    }

    /// Every stat node, indexed by [`NodeId`].
    pub fn nodes(&self) -> &[StatNode] {
        &self.nodes
    }

    /// Get a stat node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this context.
    pub fn node(&self, id: NodeId) -> &StatNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut StatNode {
        &mut self.nodes[id.0]
    }

    /// Get an effect node. Panics on a foreign id, like [`node`](Self::node).
    pub fn effect(&self, id: EffectId) -> &EffectNode {
        &self.effects[id.0]
    }

    pub fn references(&self) -> &ReferenceGraph {
        &self.references
    }

    /// Look up an attribute by variable name.
    ///
    /// # Arguments
    ///
    /// * `name` - The attribute's variable name, matched exactly
    ///
    /// # Returns
    ///
    /// The attribute's node, or `None` if the character has no such attribute.
    /// Skills and damage multipliers are separate namespaces; see
    /// [`skill`](Self::skill) and [`damage_multiplier`](Self::damage_multiplier).
    pub fn attribute(&self, name: &str) -> Option<NodeId> {
        self.attributes.get(name).copied()
    }

    pub fn skill(&self, name: &str) -> Option<NodeId> {
        self.skills.get(name).copied()
    }

    pub fn damage_multiplier(&self, name: &str) -> Option<NodeId> {
        self.damage_multipliers.get(name).copied()
    }

    /// Level of a class, matched case-insensitively.
    pub fn class_level(&self, class: &str) -> Option<f64> {
        self.class_levels.get(&class.to_lowercase()).copied()
    }

    /// The skill that overrides the default proficiency bonus, if defined.
    pub fn proficiency_bonus_skill(&self) -> Option<NodeId> {
        self.skill(&self.config.proficiency_bonus_variable)
    }

    /// Find the stat an effect or proficiency targets: attributes first,
    /// then skills, then damage multipliers.
    fn target(&self, name: &str) -> Option<NodeId> {
        self.attribute(name)
            .or_else(|| self.skill(name))
            .or_else(|| self.damage_multiplier(name))
    }

    /// Resolve a formula token without computing anything.
    ///
    /// Priority: attribute, ability modifier, skill, damage multiplier,
    /// class level, total level.
    pub fn resolve_token(&self, token: &str) -> TokenRef {
        if let Some(id) = self.attribute(token) {
            return TokenRef::Attribute(id);
        }
        if let Some(id) = self
            .config
            .strip_modifier_suffix(token)
            .and_then(|base| self.attribute(base))
        {
            return TokenRef::Modifier(id);
        }
        if let Some(id) = self.skill(token) {
            return TokenRef::Skill(id);
        }
        if let Some(id) = self.damage_multiplier(token) {
            return TokenRef::DamageMultiplier(id);
        }
        if let Some(caps) = CLASS_LEVEL.captures(token) {
            if let Some(level) = self.class_level(&caps[1]) {
                return TokenRef::ClassLevel(level);
            }
        }
        if token.eq_ignore_ascii_case("level") {
            return TokenRef::TotalLevel;
        }
        TokenRef::Unresolved
    }

    fn push_node(&mut self, kind: StatKind, node: StatNode) {
        let id = NodeId(self.nodes.len());
        let index = match kind {
            StatKind::Attribute => &mut self.attributes,
            StatKind::Skill => &mut self.skills,
            StatKind::DamageMultiplier => &mut self.damage_multipliers,
        };
        if index.contains_key(&node.id) {
            debug!(stat = %node.id, ?kind, "duplicate stat record ignored");
            return;
        }
        index.insert(node.id.clone(), id);
        self.references.add_node(id, node.id.clone());
        self.nodes.push(node);
    }

    fn attach_effect(&mut self, record: &EffectRecord) {
        let Some(target) = self.target(record.target_variable_name.as_str()) else {
            debug!(
                target = %record.target_variable_name,
                operation = %record.operation,
                "effect dropped: target stat does not exist"
            );
            return;
        };
        let source = match (&record.calculation, record.value) {
            (Some(calculation), _) if !calculation.trim().is_empty() => {
                EffectSource::Calculation(calculation.clone())
            }
            (_, Some(value)) => EffectSource::Value(value),
            _ => EffectSource::Empty,
        };
        let id = EffectId(self.effects.len());
        self.effects.push(EffectNode {
            target,
            operation: record.operation,
            source,
            result: None,
        });
        self.node_mut(target).effects.push(id);
    }

    /// Record every stat read by the effects and combination rules.
    fn scan_references(&mut self) {
        let mut edges = Vec::new();
        for effect in &self.effects {
            if effect.operation == Operation::Conditional {
                continue;
            }
            if let EffectSource::Calculation(formula) = &effect.source {
                for dependency in referenced_stats(self, formula) {
                    edges.push((effect.target, dependency));
                }
            }
        }
        let proficiency_bonus = self.proficiency_bonus_skill();
        for (index, node) in self.nodes.iter().enumerate() {
            let Accumulator::Skill(skill) = &node.accumulator else {
                continue;
            };
            let id = NodeId(index);
            if let Some(ability) = skill.ability.as_ref().and_then(|a| self.attribute(a.as_str())) {
                edges.push((id, ability));
            }
            if let Some(bonus) = proficiency_bonus.filter(|&bonus| bonus != id) {
                edges.push((id, bonus));
            }
        }
        for (from, to) in edges {
            self.references.add_edge(from, to);
        }
    }
}

/// Build the node graph for one character.
///
/// Disabled effects and proficiencies, and proficiencies that do not apply
/// to skills or saves, are skipped even if the store passed them through.
///
/// # Examples
///
/// ```rust
/// use charstat::model::build;
/// use charstat::records::{AttributeRecord, CharacterRecords, EffectRecord, Operation};
/// use charstat::{CharacterId, EngineConfig};
///
/// let records = CharacterRecords::new()
///     .with_attribute(AttributeRecord::ability("strength", 10.0))
///     .with_effect(EffectRecord::value("strength", Operation::Add, 2.0))
///     .with_effect(EffectRecord::value("charisma", Operation::Add, 2.0))
///     .with_class_level("Fighter", 3.0)
///     .with_class_level("Rogue", 2.0);
///
/// let ctx = build(CharacterId::parse("c1").unwrap(), &records, EngineConfig::default());
/// let strength = ctx.attribute("strength").unwrap();
///
/// assert_eq!(ctx.node(strength).effects.len(), 1); // charisma effect dropped
/// assert_eq!(ctx.total_level(), 5.0);
/// ```
pub fn build(
    character_id: CharacterId,
    records: &CharacterRecords,
    config: EngineConfig,
) -> EvaluationContext {
    let mut ctx = EvaluationContext {
        character_id,
        config,
        total_level: 0.0,
        class_levels: HashMap::new(),
        nodes: Vec::new(),
        effects: Vec::new(),
        attributes: HashMap::new(),
        skills: HashMap::new(),
        damage_multipliers: HashMap::new(),
        references: ReferenceGraph::new(),
    };

    for att in &records.attributes {
        let acc = AttributeAccumulator::new(att.base_value, att.decimal, att.attribute_type);
        ctx.push_node(
            StatKind::Attribute,
            StatNode::new(att.variable_name.clone(), Accumulator::Attribute(acc)),
        );
    }
    for skill in &records.skills {
        let acc = SkillAccumulator::new(skill.ability.clone());
        ctx.push_node(
            StatKind::Skill,
            StatNode::new(skill.variable_name.clone(), Accumulator::Skill(acc)),
        );
    }
    for dm in &records.damage_multipliers {
        ctx.push_node(
            StatKind::DamageMultiplier,
            StatNode::new(
                dm.variable_name.clone(),
                Accumulator::DamageMultiplier(DamageAccumulator::default()),
            ),
        );
    }

    for class in &records.class_levels {
        ctx.total_level += class.level;
        *ctx.class_levels.entry(class.name.to_lowercase()).or_insert(0.0) += class.level;
    }

    for effect in records.effects.iter().filter(|e| e.enabled) {
        ctx.attach_effect(effect);
    }

    for prof in records
        .proficiencies
        .iter()
        .filter(|p| p.enabled && p.kind.targets_skill())
    {
        match ctx.skill(prof.target_name.as_str()) {
            Some(skill) => ctx.node_mut(skill).proficiencies.push(prof.level),
            None => debug!(
                target = %prof.target_name,
                "proficiency dropped: target skill does not exist"
            ),
        }
    }

    ctx.scan_references();
    ctx
}
