//! # charstat - Character Stat Computation Engine
//!
//! Computes every stat of a tabletop RPG character from a user-authored
//! web of effects, proficiencies, and free-text formulas:
//! - **Lazy** evaluation (a stat computes what it reads, when it reads it)
//! - **Memoized** per pass (every stat and effect is computed once)
//! - **Cycle-safe** (stats in a dependency cycle resolve to `NaN`)
//! - **Order-independent** (same records in any order, same results)
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! ```text
//! [CharacterRecords] → build → [EvaluationContext] → compute_all → [ComputedCharacter] → StatSink
//! ```
//!
//! 1. **Records** are the raw attributes, skills, damage multipliers,
//!    class levels, effects, and proficiencies of one character
//! 2. **Builder** turns them into an arena of stat nodes, attaching each
//!    effect and proficiency to the stat it targets
//! 3. **Scheduler** computes each stat's effects (evaluating formulas,
//!    which may compute other stats) and then **combines** them
//! 4. **Results** are collected per kind and written back
//!
//! ### Stat kinds
//!
//! - **Attribute**: `(base + add) × mul`, clamped, floored unless decimal;
//!   abilities also derive `modifier = floor((result − 10) / 2)`
//! - **Skill**: `(ability modifier + proficiency bonus × proficiency + add) × mul`
//! - **Damage multiplier**: `0` (immune), `0.5` (resistant), `2` (vulnerable), else `1`
//!
//! ### Formulas
//!
//! Effect calculations may name attributes (`strength`), ability modifiers
//! (`strengthMod`), skills, damage multipliers, class levels
//! (`wizardLevel`), and the total `level`, combined with arithmetic and
//! math functions. A formula that cannot be evaluated is kept as text.
//!
//! ## Example
//!
//! ```rust
//! use charstat::records::{AttributeRecord, CharacterRecords, EffectRecord, Operation};
//! use charstat::{CharacterId, Engine};
//!
//! let records = CharacterRecords::new()
//!     .with_attribute(AttributeRecord::ability("dexterity", 16.0))
//!     .with_attribute(AttributeRecord::new("armorClass", 10.0))
//!     .with_effect(EffectRecord::calculation("armorClass", Operation::Add, "dexterityMod"))
//!     .with_effect(EffectRecord::value("armorClass", Operation::Add, 2.0));
//!
//! let computed = Engine::new().compute(CharacterId::parse("rogue1").unwrap(), &records);
//! assert_eq!(computed.attribute("armorClass").unwrap().result, 15.0);
//! ```
//!
//! ## Modules
//!
//! - [`records`] - Raw input records
//! - [`model`] - Character model builder and evaluation context
//! - [`evaluator`] - Formula token substitution and evaluation
//! - [`formula`] - Arithmetic grammar
//! - [`scheduler`] - Lazy, memoized, cycle-safe stat computation
//! - [`combine`] - Per-kind combination rules
//! - [`graph`] - Reference graph and cycle detection
//! - [`resolved`] - Computed results and write-back
//! - [`store`] / [`sink`] - Storage and write-back collaborators
//! - [`error`] - Error types

pub mod combine;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod graph;
pub mod model;
pub mod node;
pub mod records;
pub mod resolved;
pub mod scheduler;
pub mod sink;
pub mod stat_id;
pub mod store;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::{Engine, Recomputed};
pub use error::{EngineError, FormulaError, SinkError, StoreError};
pub use model::{build, EvaluationContext};
pub use node::{EffectResult, StatKind};
pub use records::{CharacterRecords, Operation};
pub use resolved::{
    AttributeUpdate, CharacterUpdate, ComputedCharacter, DamageMultiplierUpdate, SkillUpdate,
    WriteReport,
};
pub use sink::{MemorySink, StatSink};
pub use stat_id::{CharacterId, StatId};
pub use store::{CharacterStore, MemoryStore};
