//! Property renaming.
//!
//! Most property declarations are simply dropped from the metadata: the
//! surviving accessor methods carry far less semantic signal than a named
//! property slot, and they are renamed independently by the method pass.
//! Properties that carry custom attributes are renamed in place instead,
//! and a filtered property force-skips its accessors so the method pass
//! cannot disturb them out of sync.

use crate::obfuscator::Obfuscator;
use umbra_core::keys::{MethodKey, PropertyKey};
use umbra_core::map::ObfuscationStatus;
use umbra_core::model::{ModuleId, TypeId};

impl Obfuscator {
    /// Renames or drops properties in every transformable module.
    pub fn rename_properties(&mut self) {
        if !self.project.settings.rename_properties {
            return;
        }
        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }
            for t in 0..self.set.modules[m].types.len() {
                if !self.should_rename_type(m, t) {
                    continue;
                }
                let type_key = self.original_type_key(m, t);
                let mut index = 0usize;
                let mut to_drop: Vec<usize> = Vec::new();

                for p in 0..self.set.modules[m].types[t].properties.len() {
                    let (key, runtime_special, excluded, has_attrs, accessors, attribute_setter) = {
                        let ty = &self.set.modules[m].types[t];
                        let prop = &ty.properties[p];
                        let accessors: Vec<MethodKey> = prop
                            .getter
                            .iter()
                            .chain(prop.setter.iter())
                            .map(|&mi| MethodKey::of(type_key.clone(), &ty.methods[mi]))
                            .collect();
                        // Attribute construction contracts document property
                        // names; a public setter makes one externally visible.
                        let attribute_setter = ty
                            .base
                            .as_ref()
                            .is_some_and(|b| b.name.ends_with("Attribute"))
                            && prop
                                .setter
                                .is_some_and(|mi| ty.methods[mi].is_public);
                        (
                            PropertyKey::of(type_key.clone(), prop),
                            prop.is_runtime_special,
                            !Self::should_obfuscate(&prop.attributes, &ty.attributes),
                            !prop.attributes.is_empty(),
                            accessors,
                            attribute_setter,
                        )
                    };

                    if runtime_special {
                        self.map.update_property(
                            key,
                            ObfuscationStatus::Skipped("runtime special".into()),
                        );
                    } else if excluded || self.project.should_skip_property(&key) {
                        self.map
                            .update_property(key, ObfuscationStatus::Skipped("filtered".into()));
                        // keep get/set in step with the property decision
                        for accessor in accessors {
                            self.project.force_skip(accessor);
                        }
                    } else if attribute_setter {
                        self.map.update_property(
                            key,
                            ObfuscationStatus::Skipped("public setter of a custom attribute".into()),
                        );
                        // the accessors themselves remain fair game
                    } else if has_attrs {
                        let new_name = if self.project.settings.reuse_names {
                            let n = self.maker.member_name(index);
                            index += 1;
                            n
                        } else {
                            let n = self.maker.member_name(self.unique_member_index);
                            self.unique_member_index += 1;
                            n
                        };
                        self.rename_property(m, t, p, key, &new_name);
                    } else {
                        to_drop.push(p);
                    }
                }

                for &p in to_drop.iter().rev() {
                    let key = {
                        let ty = &self.set.modules[m].types[t];
                        PropertyKey::of(type_key.clone(), &ty.properties[p])
                    };
                    self.map
                        .update_property(key, ObfuscationStatus::Renamed("dropped".into()));
                    self.set.modules[m].types[t].properties.remove(p);
                }
            }
        }
    }

    fn rename_property(
        &mut self,
        m: ModuleId,
        t: TypeId,
        p: usize,
        key: PropertyKey,
        new_name: &str,
    ) {
        let current = PropertyKey {
            type_key: self.set.type_key(m, t),
            prop_type: key.prop_type.clone(),
            name: key.name.clone(),
        };
        for r in self.referencing_modules(m) {
            self.set.modules[r].retarget_property_refs(&current, new_name);
        }
        self.set.modules[m].types[t].properties[p].name = new_name.to_owned();
        self.map
            .update_property(key, ObfuscationStatus::Renamed(new_name.to_owned()));
    }
}
