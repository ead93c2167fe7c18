//! Field renaming.
//!
//! Fields are bucketed per declaring type by their field-type signature, so
//! reuse mode can hand out the same short names in unrelated types without
//! ever colliding inside one type. Skipped fields still register their
//! original name in the bucket; a later mint must not produce it.

use crate::name_group::NameGroup;
use crate::obfuscator::Obfuscator;
use std::collections::HashMap;
use tracing::debug;
use umbra_core::keys::FieldKey;
use umbra_core::map::ObfuscationStatus;
use umbra_core::model::{ModuleId, TypeId};

impl Obfuscator {
    /// Renames fields in every transformable module.
    pub fn rename_fields(&mut self) {
        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }
            for t in 0..self.set.modules[m].types.len() {
                if !self.should_rename_type(m, t) {
                    continue;
                }
                let type_key = self.original_type_key(m, t);
                let mut groups: HashMap<String, NameGroup> = HashMap::new();

                for f in 0..self.set.modules[m].types[t].fields.len() {
                    let (sig, name, runtime_special, excluded) = {
                        let ty = &self.set.modules[m].types[t];
                        let field = &ty.fields[f];
                        (
                            field.signature.clone(),
                            field.name.clone(),
                            field.is_runtime_special,
                            !Self::should_obfuscate(&field.attributes, &ty.attributes),
                        )
                    };
                    let key = FieldKey::new(type_key.clone(), sig.clone(), name.clone());
                    let group = groups.entry(sig).or_default();

                    if runtime_special && name == "value__" {
                        // Enum backing field: the runtime looks it up by name.
                        self.map
                            .update_field(key, ObfuscationStatus::Skipped("filtered".into()));
                        group.add(&name);
                    } else if excluded || self.project.should_skip_field(&key) {
                        self.map
                            .update_field(key, ObfuscationStatus::Skipped("filtered".into()));
                        group.add(&name);
                    } else {
                        let new_name = if self.project.settings.reuse_names {
                            group.get_next(&self.maker)
                        } else {
                            let n = self.maker.member_name(self.unique_member_index);
                            self.unique_member_index += 1;
                            n
                        };
                        group.add(&new_name);
                        self.rename_field(m, t, f, key, &new_name);
                    }
                }
            }
        }
    }

    /// Retargets every outstanding reference to the field, then renames the
    /// definition itself.
    fn rename_field(&mut self, m: ModuleId, t: TypeId, f: usize, key: FieldKey, new_name: &str) {
        let current = FieldKey::new(self.set.type_key(m, t), key.signature.clone(), key.name.clone());
        for r in self.referencing_modules(m) {
            let hits = self.set.modules[r].retarget_field_refs(&current, new_name);
            if hits > 0 {
                debug!(
                    "retargeted {hits} field refs to {} in {}",
                    current.fullname(),
                    self.set.modules[r].name
                );
            }
        }
        self.set.modules[m].types[t].fields[f].name = new_name.to_owned();
        self.map
            .update_field(key, ObfuscationStatus::Renamed(new_name.to_owned()));
    }
}
