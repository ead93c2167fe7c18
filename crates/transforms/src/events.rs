//! Event renaming. Same shape as the property pass: runtime-special events
//! are untouchable, filtered events force-skip their add/remove accessors,
//! attribute-carrying events are renamed in place, and the rest have their
//! declarations dropped while the accessors live on as plain methods.

use crate::obfuscator::Obfuscator;
use umbra_core::keys::{EventKey, MethodKey};
use umbra_core::map::ObfuscationStatus;
use umbra_core::model::{ModuleId, TypeId};

impl Obfuscator {
    /// Renames or drops events in every transformable module.
    pub fn rename_events(&mut self) {
        if !self.project.settings.rename_events {
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

                for e in 0..self.set.modules[m].types[t].events.len() {
                    let (key, runtime_special, excluded, has_attrs, accessors) = {
                        let ty = &self.set.modules[m].types[t];
                        let evt = &ty.events[e];
                        let accessors: Vec<MethodKey> = evt
                            .add
                            .iter()
                            .chain(evt.remove.iter())
                            .map(|&mi| MethodKey::of(type_key.clone(), &ty.methods[mi]))
                            .collect();
                        (
                            EventKey::of(type_key.clone(), evt),
                            evt.is_runtime_special,
                            !Self::should_obfuscate(&evt.attributes, &ty.attributes),
                            !evt.attributes.is_empty(),
                            accessors,
                        )
                    };

                    if runtime_special {
                        self.map
                            .update_event(key, ObfuscationStatus::Skipped("runtime special".into()));
                    } else if excluded || self.project.should_skip_event(&key) {
                        self.map
                            .update_event(key, ObfuscationStatus::Skipped("filtered".into()));
                        // keep add/remove in step with the event decision
                        for accessor in accessors {
                            self.project.force_skip(accessor);
                        }
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
                        self.rename_event(m, t, e, key, &new_name);
                    } else {
                        to_drop.push(e);
                    }
                }

                for &e in to_drop.iter().rev() {
                    let key = {
                        let ty = &self.set.modules[m].types[t];
                        EventKey::of(type_key.clone(), &ty.events[e])
                    };
                    self.map
                        .update_event(key, ObfuscationStatus::Renamed("dropped".into()));
                    self.set.modules[m].types[t].events.remove(e);
                }
            }
        }
    }

    fn rename_event(&mut self, m: ModuleId, t: TypeId, e: usize, key: EventKey, new_name: &str) {
        let current = EventKey {
            type_key: self.set.type_key(m, t),
            event_type: key.event_type.clone(),
            name: key.name.clone(),
        };
        for r in self.referencing_modules(m) {
            self.set.modules[r].retarget_event_refs(&current, new_name);
        }
        self.set.modules[m].types[t].events[e].name = new_name.to_owned();
        self.map
            .update_event(key, ObfuscationStatus::Renamed(new_name.to_owned()));
    }
}
