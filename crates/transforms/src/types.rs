//! Type and namespace renaming, manifest-resource renaming, and the
//! custom-attribute literal patch.
//!
//! Per module the pass builds an old→new full-name table while it renames;
//! once all of the module's types are done, attribute literals holding
//! type-name strings are rewritten through that table. The literals are
//! opaque strings in the binary encoding, so structural reference
//! retargeting never reaches them.

use crate::obfuscator::Obfuscator;
use std::collections::HashMap;
use tracing::debug;
use umbra_core::keys::TypeKey;
use umbra_core::map::ObfuscationStatus;
use umbra_core::model::{AttrValue, CustomAttribute, Module, ModuleId, Opcode, TypeId};

/// Declared argument type marking a type-name-valued attribute position.
const SYSTEM_TYPE: &str = "System.Type";

/// Return type that identifies a generated resource-manager accessor.
const RESOURCE_MANAGER: &str = "System.Resources.ResourceManager";

impl Obfuscator {
    /// Renames types, namespaces, and matching manifest resources, then
    /// patches attribute literals per module.
    pub fn rename_types(&mut self) {
        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }
            let mut rename_table: HashMap<String, String> = HashMap::new();
            let mut remaining: Vec<usize> = (0..self.set.modules[m].resources.len()).collect();
            let mut type_index = 0usize;

            for t in 0..self.set.modules[m].types.len() {
                let unrenamed = self.original_type_key(m, t);
                let full_name = unrenamed.fullname();

                if !self.should_rename_type(m, t) {
                    self.map
                        .update_type(unrenamed, ObfuscationStatus::Skipped("marked".into()));
                    self.skip_resources(m, &mut remaining, &full_name, "marked");
                    continue;
                }
                let attr_excluded =
                    Self::obfuscation_attr(&self.set.modules[m].types[t].attributes)
                        .is_some_and(|a| a.exclude);
                if attr_excluded || self.project.should_skip_type(&unrenamed) {
                    self.map
                        .update_type(unrenamed, ObfuscationStatus::Skipped("filtered".into()));
                    self.skip_resources(m, &mut remaining, &full_name, "filtered");
                    continue;
                }

                let (generic_count, nested) = {
                    let ty = &self.set.modules[m].types[t];
                    (ty.generic_params.len(), ty.declaring.is_some())
                };
                let (mut name, mut namespace) = if self.project.settings.reuse_names {
                    let pair = (
                        self.maker.type_name(type_index),
                        self.maker.namespace(type_index),
                    );
                    type_index += 1;
                    pair
                } else {
                    let pair = (
                        self.maker.member_name(self.unique_type_index),
                        self.maker.namespace(self.unique_type_index),
                    );
                    self.unique_type_index += 1;
                    pair
                };
                if generic_count > 0 {
                    name = format!("{name}`{generic_count}");
                }
                if nested {
                    // Nested types have no namespace of their own.
                    namespace = String::new();
                }
                let new_full = if namespace.is_empty() {
                    name.clone()
                } else {
                    format!("{namespace}.{name}")
                };

                self.rename_type_resources(m, t, &mut remaining, &full_name, &new_full);
                self.rename_type(m, t, namespace, name, unrenamed);

                let new_current = self.set.type_key(m, t).fullname();
                rename_table.insert(full_name.replace('/', "+"), new_current.replace('/', "+"));
            }

            for &idx in &remaining {
                let name = self.set.modules[m].resources[idx].name.clone();
                self.map
                    .add_resource(name, ObfuscationStatus::Skipped("no clear new name".into()));
            }

            patch_attribute_literals(&mut self.set.modules[m], &rename_table);
            debug!(
                "module {}: {} types renamed",
                self.set.modules[m].name,
                rename_table.len()
            );
        }
    }

    /// Marks all resources prefixed by the type's original full name as
    /// skipped and drops them from further consideration.
    fn skip_resources(
        &mut self,
        m: ModuleId,
        remaining: &mut Vec<usize>,
        full_name: &str,
        reason: &str,
    ) {
        let prefix = format!("{full_name}.");
        let mut i = 0;
        while i < remaining.len() {
            let idx = remaining[i];
            let name = self.set.modules[m].resources[idx].name.clone();
            if name.starts_with(&prefix) {
                self.map
                    .add_resource(name, ObfuscationStatus::Skipped(reason.into()));
                remaining.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Renames resources carrying the type's original full name as a prefix
    /// and patches the full-name literal inside a generated resource-manager
    /// accessor so designer-generated lookup code keeps working.
    fn rename_type_resources(
        &mut self,
        m: ModuleId,
        t: TypeId,
        remaining: &mut Vec<usize>,
        old_full: &str,
        new_full: &str,
    ) {
        let prefix = format!("{old_full}.");
        let mut i = 0;
        while i < remaining.len() {
            let idx = remaining[i];
            let res_name = self.set.modules[m].resources[idx].name.clone();
            if !res_name.starts_with(&prefix) {
                i += 1;
                continue;
            }

            for method in &mut self.set.modules[m].types[t].methods {
                if method.return_type != RESOURCE_MANAGER {
                    continue;
                }
                let Some(body) = method.body.as_mut() else {
                    continue;
                };
                for instr in &mut body.instructions {
                    if let Opcode::LdStr(value) = &mut instr.op {
                        if value == old_full {
                            *value = new_full.to_owned();
                        }
                    }
                }
            }

            let suffix = &res_name[old_full.len()..];
            let new_name = format!("{new_full}{suffix}");
            self.set.modules[m].resources[idx].name = new_name.clone();
            self.map
                .add_resource(res_name, ObfuscationStatus::Renamed(new_name));
            remaining.remove(i);
        }
    }

    /// Retargets every outstanding reference to the type, then renames the
    /// definition itself.
    fn rename_type(
        &mut self,
        m: ModuleId,
        t: TypeId,
        new_namespace: String,
        new_name: String,
        unrenamed: TypeKey,
    ) {
        let current = self.set.type_key(m, t);
        for r in self.referencing_modules(m) {
            self.set.modules[r].retarget_type_refs(&current, &new_namespace, &new_name);
        }

        let ty = &mut self.set.modules[m].types[t];
        ty.namespace = new_namespace;
        ty.name = new_name;

        let renamed = self.set.type_key(m, t);
        self.map
            .update_type(unrenamed, ObfuscationStatus::Renamed(renamed.to_string()));
    }
}

/// Rewrites type-name string literals in the module's custom attributes
/// through the old→new table. Only arguments whose declared type is
/// `System.Type` are touched; any trailing assembly qualification is carried
/// over unchanged. Running the patch twice is a no-op because new names
/// never appear as table keys.
pub fn patch_attribute_literals(module: &mut Module, table: &HashMap<String, String>) {
    for ty in &mut module.types {
        patch_attrs(&mut ty.attributes, table);
        for method in &mut ty.methods {
            patch_attrs(&mut method.attributes, table);
        }
        for field in &mut ty.fields {
            patch_attrs(&mut field.attributes, table);
        }
        for prop in &mut ty.properties {
            patch_attrs(&mut prop.attributes, table);
        }
        for evt in &mut ty.events {
            patch_attrs(&mut evt.attributes, table);
        }
    }
}

fn patch_attrs(attrs: &mut [CustomAttribute], table: &HashMap<String, String>) {
    for attr in attrs {
        for i in 0..attr.ctor_args.len() {
            if attr.ctor_sig.get(i).map(String::as_str) != Some(SYSTEM_TYPE) {
                continue;
            }
            if let AttrValue::Str(value) = &mut attr.ctor_args[i] {
                *value = obfuscated_type_name(value, table);
            }
        }
        for named in &mut attr.named_args {
            if named.arg_type != SYSTEM_TYPE {
                continue;
            }
            if let AttrValue::Str(value) = &mut named.value {
                *value = obfuscated_type_name(value, table);
            }
        }
    }
}

/// Looks up the bare type name of a possibly assembly-qualified literal and
/// rewrites it, re-appending the qualification verbatim.
fn obfuscated_type_name(literal: &str, table: &HashMap<String, String>) -> String {
    let parts: Vec<&str> = literal.split(',').collect();
    let bare = parts[0].trim();
    match table.get(bare) {
        Some(new_name) => {
            let mut out = new_name.clone();
            for part in &parts[1..] {
                out.push(',');
                out.push_str(part);
            }
            out
        }
        None => literal.to_owned(),
    }
}
