//! Cycle detection example: Stats that depend on each other
//!
//! This example shows:
//! - What happens when formulas reference each other in a loop
//! - How cycles are reported
//! - That stats outside the cycle still compute normally

use charstat::records::{AttributeRecord, EffectRecord, Operation};
use charstat::*;

fn main() -> Result<(), EngineError> {
    println!("=== Setting up circular dependencies ===\n");

    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("a", 10.0))
        .with_attribute(AttributeRecord::new("b", 20.0))
        .with_attribute(AttributeRecord::new("c", 30.0))
        .with_attribute(AttributeRecord::new("reader", 1.0))
        .with_attribute(AttributeRecord::new("speed", 30.0))
        // a -> b -> c -> a
        .with_effect(EffectRecord::calculation("a", Operation::Add, "b"))
        .with_effect(EffectRecord::calculation("b", Operation::Add, "c"))
        .with_effect(EffectRecord::calculation("c", Operation::Add, "a"))
        // reads the cycle without being part of it
        .with_effect(EffectRecord::calculation("reader", Operation::Add, "a * 2"))
        .with_effect(EffectRecord::value("speed", Operation::Add, 10.0));
    println!("a: 10 + b");
    println!("b: 20 + c");
    println!("c: 30 + a");
    println!("reader: 1 + a * 2");
    println!("speed: 30 + 10");

    println!("\n=== Computing (cycles resolve to NaN) ===\n");

    let computed = Engine::new().compute(CharacterId::parse("loop")?, &records);

    for cycle in &computed.cycles {
        let names: Vec<&str> = cycle.iter().map(StatId::as_str).collect();
        println!("✓ Cycle detected: {}", names.join(" <-> "));
    }

    println!();
    for attribute in &computed.attributes {
        let marker = if attribute.result.is_nan() { "✗" } else { "✓" };
        println!("{} {}: {}", marker, attribute.variable_name, attribute.result);
    }

    Ok(())
}
