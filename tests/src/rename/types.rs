use crate::fixtures::{linked_pair, method, project_for};
use umbra_core::keys::TypeKey;
use umbra_core::map::{ObfuscationStatus, SymbolKey};
use umbra_core::model::{
    Instruction, MethodBody, Module, ModuleSet, Opcode, Resource, TypeDef,
};
use umbra_core::project::SkipRules;
use umbra_transform::Obfuscator;

fn single_module(module: Module) -> ModuleSet {
    let mut set = ModuleSet::new();
    set.push(module);
    set.link();
    set
}

#[test]
fn types_get_minted_name_and_namespace() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme.Data", "Widget"));
    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_types();

    let ty = &obfuscator.set.modules[0].types[0];
    assert_eq!(ty.name, "A");
    assert_eq!(ty.namespace, "a");

    let status = obfuscator
        .map()
        .status(&SymbolKey::Type(TypeKey::new("lib", "Acme.Data", "Widget")));
    assert_eq!(status, ObfuscationStatus::Renamed("[lib]a.A".into()));
}

#[test]
fn generic_types_keep_their_arity_suffix() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Cache");
    ty.generic_params = vec!["TKey".to_owned(), "TValue".to_owned()];
    module.types.push(ty);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_types();

    assert_eq!(obfuscator.set.modules[0].types[0].name, "A`2");
}

#[test]
fn nested_types_get_an_empty_namespace() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Outer"));
    let mut inner = TypeDef::new(String::new(), "Inner");
    inner.declaring = Some(0);
    module.types.push(inner);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_types();

    let inner = &obfuscator.set.modules[0].types[1];
    assert!(inner.namespace.is_empty());
    assert_ne!(inner.name, "Inner");
}

#[test]
fn resources_follow_their_renamed_type() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Widget"));
    module.resources.push(Resource {
        name: "Acme.Widget.resources".to_owned(),
    });
    module.resources.push(Resource {
        name: "loose.bin".to_owned(),
    });

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_types();

    assert_eq!(obfuscator.set.modules[0].resources[0].name, "a.A.resources");
    // The loose resource has no owning type and keeps its name.
    assert_eq!(obfuscator.set.modules[0].resources[1].name, "loose.bin");
    let statuses: Vec<_> = obfuscator.map().resources().to_vec();
    assert!(statuses.contains(&(
        "Acme.Widget.resources".to_owned(),
        ObfuscationStatus::Renamed("a.A.resources".into())
    )));
    assert!(statuses.contains(&(
        "loose.bin".to_owned(),
        ObfuscationStatus::Skipped("no clear new name".into())
    )));
}

#[test]
fn resource_manager_accessor_literal_is_patched() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Widget");
    let mut accessor = method("get_ResourceManager");
    accessor.return_type = "System.Resources.ResourceManager".to_owned();
    accessor.body = Some(MethodBody {
        locals: Vec::new(),
        instructions: vec![
            Instruction::new(Opcode::LdStr("Acme.Widget".to_owned())),
            Instruction::new(Opcode::Ret),
        ],
    });
    ty.methods.push(accessor);
    module.types.push(ty);
    module.resources.push(Resource {
        name: "Acme.Widget.resources".to_owned(),
    });

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_types();

    let body = obfuscator.set.modules[0].types[0].methods[0]
        .body
        .as_ref()
        .unwrap();
    assert_eq!(body.instructions[0].op, Opcode::LdStr("a.A".to_owned()));
}

#[test]
fn filtered_types_and_their_resources_are_skipped() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Widget"));
    module.resources.push(Resource {
        name: "Acme.Widget.resources".to_owned(),
    });

    let mut project = project_for(&["lib"]);
    project.modules[0].skip = SkipRules {
        types: vec!["Acme.Widget".to_owned()],
        ..SkipRules::default()
    };
    let mut obfuscator = Obfuscator::new(project, single_module(module));
    obfuscator.rename_types();

    assert_eq!(obfuscator.set.modules[0].types[0].name, "Widget");
    let status = obfuscator
        .map()
        .status(&SymbolKey::Type(TypeKey::new("lib", "Acme", "Widget")));
    assert_eq!(status, ObfuscationStatus::Skipped("filtered".into()));
    assert!(obfuscator.map().resources().contains(&(
        "Acme.Widget.resources".to_owned(),
        ObfuscationStatus::Skipped("filtered".into())
    )));
}

#[test]
fn marked_only_mode_skips_unmarked_types_as_marked() {
    let mut module = Module::new("lib");
    module.types.push(TypeDef::new("Acme", "Widget"));

    let mut project = project_for(&["lib"]);
    project.settings.marked_only = true;
    let mut obfuscator = Obfuscator::new(project, single_module(module));
    obfuscator.rename_types();

    let status = obfuscator
        .map()
        .status(&SymbolKey::Type(TypeKey::new("lib", "Acme", "Widget")));
    assert_eq!(status, ObfuscationStatus::Skipped("marked".into()));
}

#[test]
fn type_references_in_other_modules_are_retargeted() {
    let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), linked_pair());
    obfuscator.rename_types();

    let lib_type = &obfuscator.set.modules[0].types[0];
    let app = &obfuscator.set.modules[1];
    assert_eq!(app.type_refs[0].name, lib_type.name);
    assert_eq!(app.type_refs[0].namespace, lib_type.namespace);
    assert!(app.unresolved_type_refs.is_empty());
}
