use crate::fixtures::{linked_pair, project_for};
use umbra_core::model::{MemberRefEntry, TypeRefEntry};
use umbra_transform::{report, Obfuscator};

#[test]
fn identical_runs_produce_identical_output() {
    let run = || {
        let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), linked_pair());
        obfuscator.run();
        let modules = serde_json::to_value(&obfuscator.set).unwrap();
        let mut mapping = Vec::new();
        report::write_text_map(obfuscator.map(), &mut mapping).unwrap();
        (modules, String::from_utf8(mapping).unwrap())
    };

    let (first_modules, first_mapping) = run();
    let (second_modules, second_mapping) = run();
    assert_eq!(first_modules, second_modules);
    assert_eq!(first_mapping, second_mapping);
}

#[test]
fn renamed_symbols_leave_no_unresolved_references_behind() {
    let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), linked_pair());
    obfuscator.run();

    // Every reference the app held pointed at a renamed symbol in lib, so
    // the worklists must have been fully consumed.
    let app = &obfuscator.set.modules[1];
    assert!(app.unresolved_type_refs.is_empty());
    assert!(app.unresolved_member_refs.is_empty());
}

#[test]
fn references_to_outside_symbols_survive_without_error() {
    let mut set = linked_pair();
    set.modules[1].type_refs.push(TypeRefEntry {
        scope: "mscorlib".to_owned(),
        namespace: "System".to_owned(),
        name: "Console".to_owned(),
        declaring: None,
    });
    set.modules[1].member_refs.push(MemberRefEntry::Method {
        type_ref: 1,
        name: "WriteLine".to_owned(),
        params: vec!["System.String".to_owned()],
    });
    set.link();

    let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), set);
    obfuscator.run();

    // The dangling reference stays on the worklist; it is not an error.
    let app = &obfuscator.set.modules[1];
    assert_eq!(app.unresolved_type_refs, vec![1]);
    assert_eq!(app.unresolved_member_refs.len(), 1);
    match &app.member_refs[app.unresolved_member_refs[0]] {
        MemberRefEntry::Method { name, .. } => assert_eq!(name, "WriteLine"),
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[test]
fn report_groups_type_entries_before_their_members() {
    let mut obfuscator = Obfuscator::new(project_for(&["lib", "app"]), linked_pair());
    obfuscator.run();

    let ordered = obfuscator.map().iter_ordered();
    let widget_entries: Vec<(&str, String)> = ordered
        .iter()
        .filter(|(k, _)| k.type_key().name == "Widget")
        .map(|(k, _)| (k.kind(), k.member_name().to_owned()))
        .collect();
    assert_eq!(
        widget_entries,
        vec![
            ("type", String::new()),
            ("field", "count".to_owned()),
            ("method", "Run".to_owned()),
        ]
    );
}
