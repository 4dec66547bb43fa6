use charstat::records::{
    AttributeRecord, EffectRecord, Operation, ProficiencyKind, ProficiencyRecord, SkillRecord,
};
use charstat::*;

fn id(raw: &str) -> CharacterId {
    CharacterId::parse(raw).unwrap()
}

fn compute(records: &CharacterRecords) -> ComputedCharacter {
    Engine::new().compute(id("pc"), records)
}

fn reversed(records: &CharacterRecords) -> CharacterRecords {
    let mut records = records.clone();
    records.attributes.reverse();
    records.skills.reverse();
    records.damage_multipliers.reverse();
    records.class_levels.reverse();
    records.effects.reverse();
    records.proficiencies.reverse();
    records
}

/// Results compared through JSON, where `NaN` becomes `null` and so
/// compares equal to itself.
fn results_json(computed: &ComputedCharacter) -> serde_json::Value {
    serde_json::json!({
        "character": computed.character,
        "attributes": computed.attributes,
        "skills": computed.skills,
        "damageMultipliers": computed.damage_multipliers,
        "cycles": computed.cycles,
    })
}

/// A party member with abilities, skills, resistances, formulas, and one
/// dependency cycle.
fn sample_character() -> CharacterRecords {
    CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("strength", 14.0))
        .with_attribute(AttributeRecord::ability("dexterity", 15.0))
        .with_attribute(AttributeRecord::ability("wisdom", 12.0))
        .with_attribute(AttributeRecord::new("armorClass", 10.0))
        .with_attribute(AttributeRecord::new("hitPoints", 8.0))
        .with_attribute(AttributeRecord::new("loopA", 1.0))
        .with_attribute(AttributeRecord::new("loopB", 1.0))
        .with_attribute(AttributeRecord::new("loopReader", 1.0))
        .with_skill(SkillRecord::new("athletics", Some("strength")))
        .with_skill(SkillRecord::new("stealth", Some("dexterity")))
        .with_skill(SkillRecord::new("perception", Some("wisdom")))
        .with_damage_multiplier("fire")
        .with_damage_multiplier("cold")
        .with_class_level("Fighter", 3.0)
        .with_class_level("Rogue", 2.0)
        .with_effect(EffectRecord::value("strength", Operation::Add, 2.0))
        .with_effect(EffectRecord::calculation(
            "armorClass",
            Operation::Add,
            "dexterityMod",
        ))
        .with_effect(EffectRecord::calculation(
            "hitPoints",
            Operation::Add,
            "fighterLevel * 6 + level * strengthMod",
        ))
        .with_effect(EffectRecord::calculation(
            "perception",
            Operation::Add,
            "stealth - athletics",
        ))
        .with_effect(EffectRecord::calculation("loopA", Operation::Add, "loopB"))
        .with_effect(EffectRecord::calculation("loopB", Operation::Add, "loopA"))
        .with_effect(EffectRecord::calculation(
            "loopReader",
            Operation::Add,
            "loopA + 1",
        ))
        .with_effect(EffectRecord::value("fire", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("cold", Operation::Mul, 2.0))
        .with_effect(EffectRecord::value("cold", Operation::Mul, 0.5))
        .with_proficiency(ProficiencyRecord::new("athletics", 1.0))
        .with_proficiency(ProficiencyRecord::new("stealth", 2.0))
}

/// Test a complete recompute of a sample character.
#[test]
fn test_complete_character() {
    let computed = compute(&sample_character());

    // strength 16 (+3), dexterity 15 (+2), wisdom 12 (+1), level 5 (bonus 3)
    assert_eq!(computed.total_level(), 5.0);
    let strength = computed.attribute("strength").unwrap();
    assert_eq!(strength.result, 16.0);
    assert_eq!(strength.modifier, Some(3.0));
    assert_eq!(computed.attribute("armorClass").unwrap().result, 12.0);
    assert_eq!(computed.attribute("armorClass").unwrap().modifier, None);
    // 8 + 3 * 6 + 5 * 3
    assert_eq!(computed.attribute("hitPoints").unwrap().result, 41.0);

    assert_eq!(computed.skill("athletics").unwrap().result, 6.0);
    assert_eq!(computed.skill("stealth").unwrap().result, 8.0);
    assert_eq!(computed.skill("stealth").unwrap().proficiency_level, 2.0);
    // 1 + (8 - 6)
    assert_eq!(computed.skill("perception").unwrap().result, 3.0);

    assert_eq!(computed.damage_multiplier("fire").unwrap().result, 0.5);
    assert_eq!(computed.damage_multiplier("cold").unwrap().result, 1.0);

    assert!(computed.attribute("loopA").unwrap().result.is_nan());
    assert!(computed.attribute("loopB").unwrap().result.is_nan());
    assert!(computed.attribute("loopReader").unwrap().result.is_nan());
    assert_eq!(
        computed.cycles,
        vec![vec![StatId::from_str("loopA"), StatId::from_str("loopB")]]
    );
}

/// Test that record order does not change any result.
#[test]
fn test_order_independence() {
    let records = sample_character();
    let forward = compute(&records);
    let backward = compute(&reversed(&records));
    assert_eq!(results_json(&forward), results_json(&backward));

    // Rotations visit the cycle from a different member first.
    let mut rotated = records.clone();
    rotated.attributes.rotate_left(6);
    rotated.effects.rotate_left(5);
    assert_eq!(results_json(&forward), results_json(&compute(&rotated)));
}

/// Test that recomputing the same records gives the same results.
#[test]
fn test_idempotence() {
    let records = sample_character();
    let engine = Engine::new();
    let first = engine.compute(id("pc"), &records);
    let second = engine.compute(id("pc"), &records);
    assert_eq!(results_json(&first), results_json(&second));
    assert_eq!(
        serde_json::to_value(&first.breakdown).unwrap(),
        serde_json::to_value(&second.breakdown).unwrap()
    );
}

/// Test the attribute combination rule.
#[test]
fn test_attribute_add_then_multiply() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("carry", 10.0))
        .with_effect(EffectRecord::value("carry", Operation::Add, 2.0))
        .with_effect(EffectRecord::value("carry", Operation::Mul, 1.5));
    assert_eq!(compute(&records).attribute("carry").unwrap().result, 18.0);
}

/// Test the highest base effect replacing a lower stored base.
#[test]
fn test_base_effect_keeps_highest() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("armorClass", 10.0))
        .with_effect(EffectRecord::value("armorClass", Operation::Base, 13.0))
        .with_effect(EffectRecord::value("armorClass", Operation::Base, 12.0))
        .with_effect(EffectRecord::value("armorClass", Operation::Add, 1.0));
    assert_eq!(compute(&records).attribute("armorClass").unwrap().result, 14.0);
}

/// Test min and max effects bounding results.
#[test]
fn test_clamp_bounds() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("speed", 30.0))
        .with_attribute(AttributeRecord::new("hitPoints", 5.0))
        .with_skill(SkillRecord::new("insight", None))
        .with_effect(EffectRecord::value("speed", Operation::Add, 20.0))
        .with_effect(EffectRecord::value("speed", Operation::Max, 40.0))
        .with_effect(EffectRecord::value("speed", Operation::Max, 45.0))
        .with_effect(EffectRecord::value("hitPoints", Operation::Min, 12.0))
        .with_effect(EffectRecord::value("insight", Operation::Min, 10.0));
    let computed = compute(&records);

    assert_eq!(computed.attribute("speed").unwrap().result, 40.0);
    assert_eq!(computed.attribute("hitPoints").unwrap().result, 12.0);
    assert_eq!(computed.skill("insight").unwrap().result, 10.0);
}

/// Test decimal attributes keeping fractions.
#[test]
fn test_decimal_attribute() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("weight", 7.0).decimal())
        .with_attribute(AttributeRecord::new("rounded", 7.0))
        .with_effect(EffectRecord::value("weight", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("rounded", Operation::Mul, 0.5));
    let computed = compute(&records);

    assert_eq!(computed.attribute("weight").unwrap().result, 3.5);
    assert_eq!(computed.attribute("rounded").unwrap().result, 3.0);
}

/// Test ability modifiers, including negative ones.
#[test]
fn test_ability_modifiers() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("constitution", 14.0))
        .with_attribute(AttributeRecord::ability("intelligence", 7.0));
    let computed = compute(&records);

    assert_eq!(computed.attribute("constitution").unwrap().modifier, Some(2.0));
    assert_eq!(computed.attribute("intelligence").unwrap().modifier, Some(-2.0));
}

/// Test the skill rule with the level-based proficiency bonus.
#[test]
fn test_skill_with_default_proficiency_bonus() {
    let at_level = |level: f64| {
        CharacterRecords::new()
            .with_attribute(AttributeRecord::ability("strength", 14.0))
            .with_skill(SkillRecord::new("athletics", Some("strength")))
            .with_proficiency(ProficiencyRecord::new("athletics", 1.0))
            .with_class_level("Fighter", level)
    };

    // 2 (strength) + 2 (bonus at level 4)
    assert_eq!(compute(&at_level(4.0)).skill("athletics").unwrap().result, 4.0);
    // bonus rises to 3 at level 5
    assert_eq!(compute(&at_level(5.0)).skill("athletics").unwrap().result, 5.0);
}

/// Test half proficiency and the highest proficiency winning.
#[test]
fn test_proficiency_levels() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("dexterity", 10.0))
        .with_skill(SkillRecord::new("sleightOfHand", Some("dexterity")))
        .with_skill(SkillRecord::new("acrobatics", Some("dexterity")))
        .with_proficiency(ProficiencyRecord::new("sleightOfHand", 0.5))
        .with_proficiency(ProficiencyRecord::new("acrobatics", 1.0))
        .with_proficiency(ProficiencyRecord::new("acrobatics", 2.0))
        .with_class_level("Bard", 1.0);
    let computed = compute(&records);

    // floor(0 + 2 * 0.5)
    assert_eq!(computed.skill("sleightOfHand").unwrap().result, 1.0);
    assert_eq!(computed.skill("acrobatics").unwrap().result, 4.0);
    assert_eq!(computed.skill("acrobatics").unwrap().proficiency_level, 2.0);
}

/// Test disabled and non-skill proficiencies being ignored.
#[test]
fn test_ignored_proficiencies() {
    let mut disabled = ProficiencyRecord::new("athletics", 1.0);
    disabled.enabled = false;
    let mut weapon = ProficiencyRecord::new("athletics", 1.0);
    weapon.kind = ProficiencyKind::Weapon;
    let records = CharacterRecords::new()
        .with_skill(SkillRecord::new("athletics", None))
        .with_proficiency(disabled)
        .with_proficiency(weapon)
        .with_class_level("Fighter", 1.0);
    let skill = compute(&records).skill("athletics").cloned().unwrap();

    assert_eq!(skill.proficiency_level, 0.0);
    assert_eq!(skill.result, 0.0);
}

/// Test a character-defined proficiency bonus skill overriding the default.
#[test]
fn test_proficiency_bonus_skill_override() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("strength", 14.0))
        .with_skill(SkillRecord::new("athletics", Some("strength")))
        .with_skill(SkillRecord::new("proficiencyBonus", None))
        .with_effect(EffectRecord::value("proficiencyBonus", Operation::Add, 4.0))
        .with_proficiency(ProficiencyRecord::new("athletics", 1.0))
        .with_class_level("Fighter", 4.0);
    let computed = compute(&records);

    assert_eq!(computed.skill("proficiencyBonus").unwrap().result, 4.0);
    assert_eq!(computed.skill("athletics").unwrap().result, 6.0);
}

/// Test a renamed proficiency bonus variable.
#[test]
fn test_custom_proficiency_bonus_variable() {
    let config = EngineConfig::from_json(r#"{ "proficiencyBonusVariable": "profBonus" }"#).unwrap();
    let records = CharacterRecords::new()
        .with_skill(SkillRecord::new("arcana", None))
        .with_skill(SkillRecord::new("profBonus", None))
        .with_effect(EffectRecord::value("profBonus", Operation::Add, 5.0))
        .with_proficiency(ProficiencyRecord::new("arcana", 1.0))
        .with_class_level("Wizard", 1.0);
    let computed = Engine::with_config(config).compute(id("pc"), &records);

    assert_eq!(computed.skill("arcana").unwrap().result, 5.0);
}

/// Test skills without a usable ability.
#[test]
fn test_skill_ability_edge_cases() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("speed", 30.0))
        .with_skill(SkillRecord::new("luck", None))
        .with_skill(SkillRecord::new("missing", Some("charisma")))
        .with_skill(SkillRecord::new("running", Some("speed")))
        .with_effect(EffectRecord::value("luck", Operation::Add, 1.0));
    let computed = compute(&records);

    assert_eq!(computed.skill("luck").unwrap().result, 1.0);
    assert_eq!(computed.skill("missing").unwrap().result, 0.0);
    // speed has no modifier
    assert!(computed.skill("running").unwrap().result.is_nan());
}

/// Test skill counters and passive bonuses being reported separately.
#[test]
fn test_skill_counters() {
    let records = CharacterRecords::new()
        .with_skill(SkillRecord::new("stealth", None))
        .with_effect(EffectRecord::value("stealth", Operation::Advantage, 1.0))
        .with_effect(EffectRecord::value("stealth", Operation::Advantage, 1.0))
        .with_effect(EffectRecord::value("stealth", Operation::Disadvantage, 1.0))
        .with_effect(EffectRecord::value("stealth", Operation::PassiveAdd, 5.0))
        .with_effect(EffectRecord::value("stealth", Operation::Fail, 1.0))
        .with_effect(EffectRecord::calculation(
            "stealth",
            Operation::Conditional,
            "only in dim light",
        ))
        .with_effect(EffectRecord::value("stealth", Operation::Add, 1.0));
    let stealth = compute(&records).skill("stealth").cloned().unwrap();

    assert_eq!(stealth.result, 1.0);
    assert_eq!(stealth.advantage_count, 2);
    assert_eq!(stealth.disadvantage_count, 1);
    assert_eq!(stealth.passive_add, 5.0);
    assert_eq!(stealth.fail_count, 1);
    assert_eq!(stealth.conditional_count, 1);
}

/// Test damage multiplier markers and their precedence.
#[test]
fn test_damage_multipliers() {
    let records = CharacterRecords::new()
        .with_damage_multiplier("fire")
        .with_damage_multiplier("cold")
        .with_damage_multiplier("acid")
        .with_damage_multiplier("poison")
        .with_damage_multiplier("thunder")
        .with_damage_multiplier("radiant")
        .with_effect(EffectRecord::value("fire", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("fire", Operation::Mul, 2.0))
        .with_effect(EffectRecord::value("cold", Operation::Mul, 0.0))
        .with_effect(EffectRecord::value("cold", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("acid", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("acid", Operation::Mul, 0.5))
        .with_effect(EffectRecord::value("poison", Operation::Mul, 2.0))
        .with_effect(EffectRecord::value("thunder", Operation::Mul, 1.0))
        .with_effect(EffectRecord::value("thunder", Operation::Add, 3.0));
    let computed = compute(&records);
    let result = |name: &str| computed.damage_multiplier(name).unwrap().result;

    assert_eq!(result("fire"), 1.0);
    assert_eq!(result("cold"), 0.0);
    assert_eq!(result("acid"), 0.5);
    assert_eq!(result("poison"), 2.0);
    assert_eq!(result("thunder"), 1.0);
    assert_eq!(result("radiant"), 1.0);
}

/// Test reading other stats, modifiers, and levels from formulas.
#[test]
fn test_formula_references() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("strength", 16.0))
        .with_attribute(AttributeRecord::new("damage", 0.0))
        .with_attribute(AttributeRecord::new("spellSlots", 0.0))
        .with_attribute(AttributeRecord::new("fireDamage", 10.0).decimal())
        .with_damage_multiplier("fire")
        .with_class_level("Wizard", 3.0)
        .with_class_level("wizard", 2.0)
        .with_class_level("Cleric", 1.0)
        .with_effect(EffectRecord::calculation("damage", Operation::Add, "strengthMod + 2"))
        .with_effect(EffectRecord::calculation(
            "spellSlots",
            Operation::Add,
            "WizardLevels + clericlevel + LEVEL",
        ))
        .with_effect(EffectRecord::value("fire", Operation::Mul, 0.5))
        .with_effect(EffectRecord::calculation("fireDamage", Operation::Mul, "fire"));
    let computed = compute(&records);

    assert_eq!(computed.attribute("damage").unwrap().result, 5.0);
    // 5 + 1 + 6
    assert_eq!(computed.attribute("spellSlots").unwrap().result, 12.0);
    assert_eq!(computed.attribute("fireDamage").unwrap().result, 5.0);
}

/// Test a custom modifier suffix.
#[test]
fn test_custom_modifier_suffix() {
    let config = EngineConfig::from_json(r#"{ "modifierSuffix": "Modifier" }"#).unwrap();
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("charisma", 18.0))
        .with_attribute(AttributeRecord::new("spellDc", 8.0))
        .with_effect(EffectRecord::calculation(
            "spellDc",
            Operation::Add,
            "charismaModifier",
        ));
    let computed = Engine::with_config(config).compute(id("pc"), &records);

    assert_eq!(computed.attribute("spellDc").unwrap().result, 12.0);
}

/// Test unresolvable formulas degrading to text without affecting the stat.
#[test]
fn test_unresolved_formula_kept_as_text() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("dexterity", 14.0))
        .with_attribute(AttributeRecord::new("armorClass", 10.0))
        .with_effect(EffectRecord::value("armorClass", Operation::Add, 1.0))
        .with_effect(EffectRecord::calculation(
            "armorClass",
            Operation::Add,
            "dexterityMod + shieldBonus",
        ))
        .with_effect(EffectRecord::calculation(
            "armorClass",
            Operation::Mul,
            "haste",
        ));
    let computed = compute(&records);

    assert_eq!(computed.attribute("armorClass").unwrap().result, 11.0);
    let breakdown = computed
        .breakdown(StatKind::Attribute, "armorClass")
        .unwrap();
    let results: Vec<_> = breakdown.effects.iter().map(|e| e.result.clone()).collect();
    assert_eq!(
        results,
        vec![
            EffectResult::Number(1.0),
            EffectResult::Text(String::from("2 + shieldBonus")),
            EffectResult::Text(String::from("haste")),
        ]
    );
}

/// Test effects with neither a value nor a calculation.
#[test]
fn test_empty_effect() {
    let mut effect = EffectRecord::value("speed", Operation::Add, 0.0);
    effect.value = None;
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("speed", 30.0))
        .with_effect(effect);
    let computed = compute(&records);

    assert_eq!(computed.attribute("speed").unwrap().result, 30.0);
    assert_eq!(
        computed.breakdown(StatKind::Attribute, "speed").unwrap().effects[0].result,
        EffectResult::Text(String::new())
    );
}

/// Test division by zero producing NaN.
#[test]
fn test_division_by_zero() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("ratio", 1.0))
        .with_effect(EffectRecord::calculation("ratio", Operation::Add, "level / 0"));
    assert!(compute(&records).attribute("ratio").unwrap().result.is_nan());
}

/// Test self-referencing and mutually referencing stats.
#[test]
fn test_cycles_resolve_to_nan() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("strength", 10.0))
        .with_attribute(AttributeRecord::new("bulk", 1.0))
        .with_attribute(AttributeRecord::new("steady", 5.0))
        .with_skill(SkillRecord::new("athletics", Some("strength")))
        .with_effect(EffectRecord::calculation("bulk", Operation::Add, "bulk + 1"))
        .with_effect(EffectRecord::calculation(
            "strength",
            Operation::Add,
            "athletics",
        ))
        .with_effect(EffectRecord::value("steady", Operation::Add, 1.0));
    let computed = compute(&records);

    assert!(computed.attribute("bulk").unwrap().result.is_nan());
    let strength = computed.attribute("strength").unwrap();
    assert!(strength.result.is_nan());
    assert!(strength.modifier.is_some_and(f64::is_nan));
    assert!(computed.skill("athletics").unwrap().result.is_nan());
    assert_eq!(computed.attribute("steady").unwrap().result, 6.0);

    assert_eq!(
        computed.cycles,
        vec![
            vec![StatId::from_str("athletics"), StatId::from_str("strength")],
            vec![StatId::from_str("bulk")],
        ]
    );
    // effects of cycle members are never evaluated
    assert!(computed
        .breakdown(StatKind::Attribute, "bulk")
        .unwrap()
        .effects
        .is_empty());
}

/// Test conditional effects not creating cycles.
#[test]
fn test_conditional_reference_is_not_a_cycle() {
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::new("armorClass", 10.0))
        .with_effect(EffectRecord::calculation(
            "armorClass",
            Operation::Conditional,
            "armorClass + 2 vs. ranged",
        ));
    let computed = compute(&records);

    assert_eq!(computed.attribute("armorClass").unwrap().result, 10.0);
    assert!(computed.cycles.is_empty());
}

/// Test records decoded from stored JSON.
#[test]
fn test_json_character() {
    let records = CharacterRecords::from_json(
        r#"{
            "attributes": [
                { "variableName": "constitution", "baseValue": 13, "attributeType": "ability" },
                { "variableName": "hitPoints", "baseValue": 0, "attributeType": "healthBar" },
                { "variableName": "walkSpeed", "baseValue": 25, "attributeType": "somethingNew" }
            ],
            "skills": [
                { "variableName": "constitutionSave", "ability": "constitution" }
            ],
            "damageMultipliers": [ { "variableName": "poison" } ],
            "classLevels": [ { "name": "Paladin", "level": 6 } ],
            "effects": [
                { "targetVariableName": "constitution", "operation": "add", "value": 1 },
                { "targetVariableName": "hitPoints", "operation": "add",
                  "calculation": "paladinLevel * (6 + constitutionMod)" },
                { "targetVariableName": "walkSpeed", "operation": "add", "value": 10, "enabled": false },
                { "targetVariableName": "poison", "operation": "mul", "value": 0 }
            ],
            "proficiencies": [
                { "targetName": "constitutionSave", "level": 1, "type": "save" }
            ]
        }"#,
    )
    .unwrap();
    let computed = compute(&records);

    assert_eq!(computed.attribute("constitution").unwrap().modifier, Some(2.0));
    assert_eq!(computed.attribute("hitPoints").unwrap().result, 48.0);
    assert_eq!(computed.attribute("walkSpeed").unwrap().result, 25.0);
    // 2 + 3 (bonus at level 6)
    assert_eq!(computed.skill("constitutionSave").unwrap().result, 5.0);
    assert_eq!(computed.damage_multiplier("poison").unwrap().result, 0.0);
}

/// Test a full recompute through a store and a sink.
#[test]
fn test_recompute_round_trip() {
    let mut store = MemoryStore::new();
    store.insert(id("hero-1"), sample_character());
    let mut sink = MemorySink::new();

    let outcome = Engine::new()
        .recompute(&store, &mut sink, "hero-1")
        .unwrap();

    assert!(outcome.report.is_complete());
    // 8 attributes, 3 skills, 2 damage multipliers, 1 character
    assert_eq!(outcome.report.written, 14);
    let hero = id("hero-1");
    assert_eq!(sink.attribute(&hero, "hitPoints").unwrap().result, 41.0);
    assert_eq!(sink.skill(&hero, "stealth").unwrap().result, 8.0);
    assert_eq!(sink.damage_multiplier(&hero, "fire").unwrap().result, 0.5);
    assert_eq!(sink.characters[&hero].total_level, 5.0);
}

/// Test a rejected update not stopping the rest of the write-back.
#[test]
fn test_partial_write_back_failure() {
    let mut store = MemoryStore::new();
    store.insert(id("hero-2"), sample_character());
    let mut sink = MemorySink::new();
    sink.reject("athletics");

    let outcome = Engine::new()
        .recompute(&store, &mut sink, "hero-2")
        .unwrap();

    assert!(!outcome.report.is_complete());
    assert_eq!(outcome.report.written, 13);
    assert!(matches!(
        &outcome.report.failed[..],
        [SinkError::Rejected(stat, _)] if stat.as_str() == "athletics"
    ));
    let hero = id("hero-2");
    assert!(sink.skill(&hero, "athletics").is_none());
    assert!(sink.skill(&hero, "stealth").is_some());
}

/// Test recompute failures that stop before anything is computed.
#[test]
fn test_recompute_errors() {
    let engine = Engine::new();
    let mut store = MemoryStore::new();
    let mut sink = MemorySink::new();

    assert!(matches!(
        engine.recompute(&store, &mut sink, ""),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.recompute(&store, &mut sink, "hero/../x"),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.recompute(&store, &mut sink, "ghost"),
        Err(EngineError::Store(StoreError::CharacterNotFound(_)))
    ));

    let err = store.insert_json(id("broken"), "{ not json").unwrap_err();
    assert!(matches!(err, StoreError::Malformed(..)));
    assert!(sink.characters.is_empty());
}

/// Test deeply nested formulas degrading to text while every other stat
/// still computes.
#[test]
fn test_deeply_nested_formulas_degrade() {
    let minus = format!("{}1", "-".repeat(20_000));
    let parens = format!("{}strength{}", "(".repeat(20_000), ")".repeat(20_000));
    let chain = vec!["strengthMod"; 20_000].join(" + ");
    let records = CharacterRecords::new()
        .with_attribute(AttributeRecord::ability("strength", 14.0))
        .with_attribute(AttributeRecord::new("speed", 30.0))
        .with_attribute(AttributeRecord::new("carry", 10.0))
        .with_skill(SkillRecord::new("athletics", Some("strength")))
        .with_effect(EffectRecord::calculation("speed", Operation::Add, minus.clone()))
        .with_effect(EffectRecord::calculation("carry", Operation::Add, parens))
        .with_effect(EffectRecord::calculation("athletics", Operation::Add, chain))
        .with_effect(EffectRecord::value("carry", Operation::Add, 5.0));
    let computed = compute(&records);

    assert_eq!(computed.attribute("speed").unwrap().result, 30.0);
    assert_eq!(computed.attribute("carry").unwrap().result, 15.0);
    assert_eq!(computed.attribute("strength").unwrap().modifier, Some(2.0));
    assert_eq!(computed.skill("athletics").unwrap().result, 2.0);

    let speed = computed.breakdown(StatKind::Attribute, "speed").unwrap();
    assert_eq!(speed.effects[0].result, EffectResult::Text(minus));
    let carry = computed.breakdown(StatKind::Attribute, "carry").unwrap();
    assert!(matches!(
        &carry.effects[0].result,
        EffectResult::Text(text) if text.starts_with("((((") && text.contains("14")
    ));
}

/// Test a skill caught in a cycle still reporting its proficiency level.
#[test]
fn test_cyclic_skill_keeps_proficiency_level() {
    let records = CharacterRecords::new()
        .with_skill(SkillRecord::new("insight", None))
        .with_effect(EffectRecord::calculation("insight", Operation::Add, "insight"))
        .with_proficiency(ProficiencyRecord::new("insight", 2.0));
    let insight = compute(&records).skill("insight").cloned().unwrap();

    assert!(insight.result.is_nan());
    assert_eq!(insight.proficiency_level, 2.0);
}
