//! Basic example: Computing one character end to end
//!
//! This example demonstrates:
//! - Building character records (abilities, skills, effects, proficiencies)
//! - Formulas that read other stats and class levels
//! - Computing the character and reading the results
//! - Writing the results back through a sink

use charstat::records::{
    AttributeRecord, EffectRecord, Operation, ProficiencyRecord, SkillRecord,
};
use charstat::*;

fn main() -> Result<(), EngineError> {
    let id = CharacterId::parse("vex")?;

    // Raw records, as a store would hand them over
    println!("Building records for {}:", id);
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("dexterity", 16.0))
        .with_attribute(AttributeRecord::ability("wisdom", 13.0))
        .with_attribute(AttributeRecord::new("armorClass", 11.0))
        .with_attribute(AttributeRecord::new("hitPoints", 0.0))
        .with_skill(SkillRecord::new("stealth", Some("dexterity")))
        .with_skill(SkillRecord::new("perception", Some("wisdom")))
        .with_damage_multiplier("poison")
        .with_class_level("Ranger", 4.0)
        .with_class_level("Rogue", 1.0)
        .with_effect(EffectRecord::calculation(
            "armorClass",
            Operation::Add,
            "dexterityMod",
        ))
        .with_effect(EffectRecord::calculation(
            "hitPoints",
            Operation::Add,
            "rangerLevel * 6 + rogueLevel * 5",
        ))
        .with_effect(EffectRecord::value("stealth", Operation::Advantage, 1.0))
        .with_effect(EffectRecord::value("poison", Operation::Mul, 0.5))
        .with_proficiency(ProficiencyRecord::new("stealth", 2.0))
        .with_proficiency(ProficiencyRecord::new("perception", 1.0));
    println!("  - Armor: 11 + dexterityMod");
    println!("  - Hit points: rangerLevel * 6 + rogueLevel * 5");
    println!("  - Expertise in stealth, proficient in perception");
    println!("  - Resistant to poison");

    // Compute
    let engine = Engine::new();
    let computed = engine.compute(id.clone(), &records);

    println!("\n=== Attributes ===");
    for attribute in &computed.attributes {
        match attribute.modifier {
            Some(modifier) => println!(
                "{}: {} ({:+})",
                attribute.variable_name, attribute.result, modifier
            ),
            None => println!("{}: {}", attribute.variable_name, attribute.result),
        }
    }

    println!("\n=== Skills (level {}) ===", computed.total_level());
    for skill in &computed.skills {
        println!(
            "{}: {:+} (proficiency x{}, advantage {})",
            skill.variable_name, skill.result, skill.proficiency_level, skill.advantage_count
        );
    }

    println!("\n=== Damage Multipliers ===");
    for dm in &computed.damage_multipliers {
        println!("{}: x{}", dm.variable_name, dm.result);
    }

    println!("\n=== Breakdown: armorClass ===");
    if let Some(breakdown) = computed.breakdown(StatKind::Attribute, "armorClass") {
        for effect in &breakdown.effects {
            println!("  {} {}", effect.operation, effect.result);
        }
    }

    // Write back
    let mut sink = MemorySink::new();
    let report = computed.write_to(&mut sink);
    println!(
        "\nWrote {} updates ({} failed)",
        report.written,
        report.failed.len()
    );

    Ok(())
}
