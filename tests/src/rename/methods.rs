use crate::fixtures::{accessor, method, project_for, virtual_method};
use umbra_core::keys::{MethodKey, ParamSig, TypeKey};
use umbra_core::map::{ObfuscationStatus, SymbolKey};
use umbra_core::model::{MethodSemantics, Module, ModuleSet, PropertyDef, TypeDef};
use umbra_core::project::SkipRules;
use umbra_transform::Obfuscator;

fn single_module(module: Module) -> ModuleSet {
    let mut set = ModuleSet::new();
    set.push(module);
    set.link();
    set
}

fn method_status(obfuscator: &Obfuscator, type_key: TypeKey, name: &str, params: &[&str]) -> ObfuscationStatus {
    let sig = ParamSig::new(params.iter().map(|p| (*p).to_owned()).collect());
    obfuscator
        .map()
        .status(&SymbolKey::Method(MethodKey::new(type_key, name, sig)))
}

#[test]
fn external_base_forces_the_whole_group_to_keep_its_name() {
    let mut set = ModuleSet::new();

    let mut base_module = Module::new("base");
    base_module.external = true;
    let mut base = TypeDef::new("Acme", "Base");
    base.methods.push(virtual_method("Foo", &["System.Int32"]));
    base_module.types.push(base);
    set.push(base_module);

    let mut app = Module::new("app");
    let mut derived = TypeDef::new("Acme", "Derived");
    derived.base = Some(TypeKey::new("base", "Acme", "Base"));
    derived.methods.push(virtual_method("Foo", &["System.Int32"]));
    app.types.push(derived);
    set.push(app);
    set.link();

    let mut obfuscator = Obfuscator::new(project_for(&["app"]), set);
    obfuscator.rename_methods();

    assert_eq!(obfuscator.set.modules[1].types[0].methods[0].name, "Foo");
    let expected = ObfuscationStatus::Skipped("external base class or interface".into());
    assert_eq!(
        method_status(
            &obfuscator,
            TypeKey::new("app", "Acme", "Derived"),
            "Foo",
            &["System.Int32"]
        ),
        expected
    );
    assert_eq!(
        method_status(
            &obfuscator,
            TypeKey::new("base", "Acme", "Base"),
            "Foo",
            &["System.Int32"]
        ),
        expected
    );
}

#[test]
fn internal_override_groups_share_one_name() {
    let mut module = Module::new("lib");
    let mut base = TypeDef::new("Acme", "Base");
    base.methods.push(virtual_method("Foo", &[]));
    module.types.push(base);
    let mut derived = TypeDef::new("Acme", "Derived");
    derived.base = Some(TypeKey::new("lib", "Acme", "Base"));
    derived.methods.push(virtual_method("Foo", &[]));
    module.types.push(derived);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_methods();

    let base_name = &obfuscator.set.modules[0].types[0].methods[0].name;
    let derived_name = &obfuscator.set.modules[0].types[1].methods[0].name;
    assert_eq!(base_name, derived_name);
    assert_ne!(base_name, "Foo");
}

#[test]
fn late_skip_reason_unnames_an_already_named_group() {
    let mut module = Module::new("lib");
    let mut base = TypeDef::new("Acme", "Base");
    base.methods.push(virtual_method("Foo", &[]));
    module.types.push(base);
    let mut derived = TypeDef::new("Acme", "Derived");
    derived.base = Some(TypeKey::new("lib", "Acme", "Base"));
    derived.methods.push(virtual_method("Foo", &[]));
    module.types.push(derived);

    // Only the override is filtered; its group is discovered and named when
    // Base is scanned, then must be un-named when Derived is reached.
    let mut project = project_for(&["lib"]);
    project.modules[0].skip = SkipRules {
        methods: vec!["Acme.Derived::Foo".to_owned()],
        ..SkipRules::default()
    };
    let mut obfuscator = Obfuscator::new(project, single_module(module));
    obfuscator.rename_methods();

    assert_eq!(obfuscator.set.modules[0].types[0].methods[0].name, "Foo");
    assert_eq!(obfuscator.set.modules[0].types[1].methods[0].name, "Foo");
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Base"), "Foo", &[]),
        ObfuscationStatus::Skipped("filtered".into())
    );
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Derived"), "Foo", &[]),
        ObfuscationStatus::Skipped("filtered".into())
    );
}

#[test]
fn shared_group_names_are_blocked_in_derived_buckets() {
    let mut module = Module::new("lib");
    let mut base = TypeDef::new("Acme", "Base");
    base.methods.push(virtual_method("Foo", &[]));
    module.types.push(base);
    let mut derived = TypeDef::new("Acme", "Derived");
    derived.base = Some(TypeKey::new("lib", "Acme", "Base"));
    derived.methods.push(virtual_method("Foo", &[]));
    derived.methods.push(method("Helper"));
    module.types.push(derived);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_methods();

    let group_name = obfuscator.set.modules[0].types[0].methods[0].name.clone();
    let helper_name = obfuscator.set.modules[0].types[1].methods[1].name.clone();
    // Same signature bucket, but the shared virtual name is already taken.
    assert_ne!(group_name, helper_name);
}

#[test]
fn property_toggle_skips_accessors_with_a_toggle_reason() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Widget");
    let mut getter = accessor("get_Count", MethodSemantics::Getter);
    getter.return_type = "System.Int32".to_owned();
    ty.methods.push(getter);
    let mut vget = accessor("get_Name", MethodSemantics::Getter);
    vget.is_virtual = true;
    vget.return_type = "System.String".to_owned();
    ty.methods.push(vget);
    module.types.push(ty);

    let mut project = project_for(&["lib"]);
    project.settings.rename_properties = false;
    let mut obfuscator = Obfuscator::new(project, single_module(module));
    obfuscator.rename_methods();

    let expected = ObfuscationStatus::Skipped("skipping properties".into());
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Widget"), "get_Count", &[]),
        expected
    );
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Widget"), "get_Name", &[]),
        expected
    );
    assert_eq!(obfuscator.set.modules[0].types[0].methods[0].name, "get_Count");
}

#[test]
fn renamed_accessors_lose_their_semantics_linkage() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Widget");
    let mut getter = accessor("get_Count", MethodSemantics::Getter);
    getter.return_type = "System.Int32".to_owned();
    ty.methods.push(getter);
    module.types.push(ty);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_methods();

    let method = &obfuscator.set.modules[0].types[0].methods[0];
    assert_ne!(method.name, "get_Count");
    assert_eq!(method.semantics, MethodSemantics::None);
}

#[test]
fn operator_overloads_are_skipped_as_special_names() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Widget");
    let mut op = method("op_Addition");
    op.is_special_name = true;
    ty.methods.push(op);
    module.types.push(ty);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_methods();

    assert_eq!(obfuscator.set.modules[0].types[0].methods[0].name, "op_Addition");
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Widget"), "op_Addition", &[]),
        ObfuscationStatus::Skipped("special name".into())
    );
}

#[test]
fn filtered_properties_force_skip_their_accessors() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Widget");
    let mut getter = accessor("get_Count", MethodSemantics::Getter);
    getter.return_type = "System.Int32".to_owned();
    ty.methods.push(getter);
    let mut prop = PropertyDef::new("Count", "System.Int32");
    prop.getter = Some(0);
    ty.properties.push(prop);
    module.types.push(ty);

    let mut project = project_for(&["lib"]);
    project.modules[0].skip = SkipRules {
        properties: vec!["Acme.Widget::Count".to_owned()],
        ..SkipRules::default()
    };
    let mut obfuscator = Obfuscator::new(project, single_module(module));
    obfuscator.rename_properties();
    obfuscator.rename_methods();

    assert_eq!(obfuscator.set.modules[0].types[0].methods[0].name, "get_Count");
    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Widget"), "get_Count", &[]),
        ObfuscationStatus::Skipped("filtered".into())
    );
}

#[test]
fn runtime_methods_are_skipped() {
    let mut module = Module::new("lib");
    let mut ty = TypeDef::new("Acme", "Delegate");
    let mut invoke = method("Invoke");
    invoke.is_runtime = true;
    ty.methods.push(invoke);
    module.types.push(ty);

    let mut obfuscator = Obfuscator::new(project_for(&["lib"]), single_module(module));
    obfuscator.rename_methods();

    assert_eq!(
        method_status(&obfuscator, TypeKey::new("lib", "Acme", "Delegate"), "Invoke", &[]),
        ObfuscationStatus::Skipped("runtime method".into())
    );
}
