use crate::fixtures::{int_field, linked_pair, project_for};
use umbra_core::keys::{FieldKey, TypeKey};
use umbra_core::map::{ObfuscationStatus, SymbolKey};
use umbra_core::model::{MemberRefEntry, Module, ModuleSet, TypeDef};
use umbra_core::project::SkipRules;
use umbra_transform::Obfuscator;

fn single_module(types: Vec<TypeDef>) -> ModuleSet {
    let mut module = Module::new("lib");
    module.types = types;
    let mut set = ModuleSet::new();
    set.push(module);
    set.link();
    set
}

#[test]
fn reuse_mode_buckets_are_per_declaring_type() {
    let mut a = TypeDef::new("Acme", "Alpha");
    a.fields.push(int_field("first"));
    let mut b = TypeDef::new("Acme", "Beta");
    b.fields.push(int_field("second"));

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(vec![a, b]));
    obfuscator.rename_fields();

    // Unrelated declaring types both receive the same densely packed name.
    assert_eq!(obfuscator.set.modules[0].types[0].fields[0].name, "a");
    assert_eq!(obfuscator.set.modules[0].types[1].fields[0].name, "a");
}

#[test]
fn same_signature_fields_in_one_type_stay_distinct() {
    let mut ty = TypeDef::new("Acme", "Alpha");
    ty.fields.push(int_field("first"));
    ty.fields.push(int_field("second"));
    ty.fields
        .push(umbra_core::model::FieldDef::new("third", "System.String"));

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(vec![ty]));
    obfuscator.rename_fields();

    let fields = &obfuscator.set.modules[0].types[0].fields;
    assert_eq!(fields[0].name, "a");
    assert_eq!(fields[1].name, "b");
    // A different signature is a different bucket; the sequence restarts.
    assert_eq!(fields[2].name, "a");
}

#[test]
fn unique_mode_never_reuses_names() {
    let mut a = TypeDef::new("Acme", "Alpha");
    a.fields.push(int_field("first"));
    let mut b = TypeDef::new("Acme", "Beta");
    b.fields.push(int_field("second"));

    let mut project = project_for(&["lib"]);
    project.settings.reuse_names = false;
    let mut obfuscator = Obfuscator::new(project, single_module(vec![a, b]));
    obfuscator.rename_fields();

    assert_eq!(obfuscator.set.modules[0].types[0].fields[0].name, "a");
    assert_eq!(obfuscator.set.modules[0].types[1].fields[0].name, "b");
}

#[test]
fn enum_backing_field_keeps_its_name_but_occupies_the_bucket() {
    let mut ty = TypeDef::new("Acme", "Color");
    let mut backing = int_field("value__");
    backing.is_runtime_special = true;
    ty.fields.push(backing);
    ty.fields.push(int_field("red"));

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(vec![ty]));
    obfuscator.rename_fields();

    let fields = &obfuscator.set.modules[0].types[0].fields;
    assert_eq!(fields[0].name, "value__");
    assert_eq!(fields[1].name, "a");

    let key = FieldKey::new(TypeKey::new("lib", "Acme", "Color"), "System.Int32", "value__");
    assert_eq!(
        obfuscator.map().status(&SymbolKey::Field(key)),
        ObfuscationStatus::Skipped("filtered".into())
    );
}

#[test]
fn skipped_field_names_still_block_minting() {
    let mut ty = TypeDef::new("Acme", "Alpha");
    ty.fields.push(int_field("a"));
    ty.fields.push(int_field("other"));

    let mut project = project_for(&["lib"]);
    project.modules[0].skip = SkipRules {
        fields: vec!["Acme.Alpha::a".to_owned()],
        ..SkipRules::default()
    };
    let mut obfuscator = Obfuscator::new(project, single_module(vec![ty]));
    obfuscator.rename_fields();

    let fields = &obfuscator.set.modules[0].types[0].fields;
    // The filtered field keeps "a", so the mint skips to "b".
    assert_eq!(fields[0].name, "a");
    assert_eq!(fields[1].name, "b");
}

#[test]
fn field_references_are_retargeted_before_the_definition() {
    let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), linked_pair());
    obfuscator.rename_fields();

    let app = &obfuscator.set.modules[1];
    match &app.member_refs[0] {
        MemberRefEntry::Field { name, .. } => {
            assert_eq!(name, &obfuscator.set.modules[0].types[0].fields[0].name);
        }
        other => panic!("unexpected entry: {other:?}"),
    }
    // consumed from the worklist, never revisited
    assert!(!app.unresolved_member_refs.contains(&0));
}
