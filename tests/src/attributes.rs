use crate::fixtures::project_for;
use std::collections::HashMap;
use umbra_core::model::{
    AttrValue, CustomAttribute, Module, ModuleSet, NamedArg, TypeDef,
};
use umbra_transform::types::patch_attribute_literals;
use umbra_transform::Obfuscator;

fn type_literal_attribute(value: &str) -> CustomAttribute {
    let mut attr = CustomAttribute::new("Acme.TargetAttribute");
    attr.ctor_sig = vec!["System.Type".to_owned(), "System.String".to_owned()];
    attr.ctor_args = vec![
        AttrValue::Str(value.to_owned()),
        AttrValue::Str("untouched".to_owned()),
    ];
    attr.named_args.push(NamedArg {
        name: "Fallback".to_owned(),
        arg_type: "System.Type".to_owned(),
        value: AttrValue::Str(value.to_owned()),
    });
    attr
}

#[test]
fn type_pass_patches_attribute_literals_with_qualification() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Widget"));
    let mut consumer = TypeDef::new("Acme", "Consumer");
    consumer
        .attributes
        .push(type_literal_attribute("Acme.Widget, lib, Version=1.0.0.0"));
    module.types.push(consumer);

    let mut set = ModuleSet::new();
    set.push(module);
    set.link();

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), set);
    obfuscator.rename_types();

    let attr = &obfuscator.set.modules[0].types[1].attributes[0];
    match &attr.ctor_args[0] {
        AttrValue::Str(s) => assert_eq!(s, "a.A, lib, Version=1.0.0.0"),
        other => panic!("unexpected value: {other:?}"),
    }
    // A string-typed position is never rewritten, even if it matched.
    match &attr.ctor_args[1] {
        AttrValue::Str(s) => assert_eq!(s, "untouched"),
        other => panic!("unexpected value: {other:?}"),
    }
    match &attr.named_args[0].value {
        AttrValue::Str(s) => assert_eq!(s, "a.A, lib, Version=1.0.0.0"),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn patching_twice_produces_the_same_module_state() {
    let mut module = Module::new("lib");
    let mut consumer = TypeDef::new("Acme", "Consumer");
    consumer
        .attributes
        .push(type_literal_attribute("Acme.Widget, lib"));
    module.types.push(consumer);

    let mut table = HashMap::new();
    table.insert("Acme.Widget".to_owned(), "a.A".to_owned());

    patch_attribute_literals(&mut module, &table);
    let once = serde_json::to_value(&module).unwrap();
    patch_attribute_literals(&mut module, &table);
    let twice = serde_json::to_value(&module).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn attributes_on_members_are_patched_too() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Widget"));
    let mut holder = TypeDef::new("Acme", "Holder");
    let mut field = umbra_core::model::FieldDef::new("target", "System.String");
    field.attributes.push(type_literal_attribute("Acme.Widget"));
    holder.fields.push(field);
    module.types.push(holder);

    let mut set = ModuleSet::new();
    set.push(module);
    set.link();

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), set);
    obfuscator.rename_types();

    let attr = &obfuscator.set.modules[0].types[1].fields[0].attributes[0];
    match &attr.ctor_args[0] {
        AttrValue::Str(s) => assert_eq!(s, "a.A"),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn nested_type_literals_use_plus_separators() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Outer"));
    let mut inner = TypeDef::new(String::new(), "Inner");
    inner.declaring = Some(0);
    module.types.push(inner);
    let mut consumer = TypeDef::new("Acme", "Consumer");
    consumer
        .attributes
        .push(type_literal_attribute("Acme.Outer+Inner"));
    module.types.push(consumer);

    let mut set = ModuleSet::new();
    set.push(module);
    set.link();

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), set);
    obfuscator.rename_types();

    let outer = &obfuscator.set.modules[0].types[0];
    let inner = &obfuscator.set.modules[0].types[1];
    let expected = format!("{}.{}+{}", outer.namespace, outer.name, inner.name);
    let attr = &obfuscator.set.modules[0].types[2].attributes[0];
    match &attr.ctor_args[0] {
        AttrValue::Str(s) => assert_eq!(s, &expected),
        other => panic!("unexpected value: {other:?}"),
    }
}
