//! Method renaming, in two passes per module.
//!
//! Pass 1 resolves every method's decision. Non-virtual methods are decided
//! immediately; virtual methods go through their inheritance group so that
//! every override and interface implementation ends up with the identical
//! name. Group membership and skip eligibility are discovered incrementally
//! while scanning types in declaration order, so a group that was already
//! named may have to be un-named when a later member brings a skip reason.
//! Between the passes each type's name bucket absorbs its ancestors'
//! buckets, so a fresh name can never shadow an inherited, still-visible
//! one. Pass 2 applies the resolved decisions and retargets references.

use crate::name_group::NameGroup;
use crate::obfuscator::Obfuscator;
use std::collections::HashMap;
use umbra_core::keys::{MethodKey, ParamSig, TypeKey};
use umbra_core::map::ObfuscationStatus;
use umbra_core::model::{MethodSemantics, ModuleId, TypeId};

type SigNames = HashMap<ParamSig, NameGroup>;
type BaseSigNames = HashMap<TypeKey, SigNames>;

impl Obfuscator {
    /// Renames methods in every transformable module.
    pub fn rename_methods(&mut self) {
        let mut base_sig_names: BaseSigNames = HashMap::new();

        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }

            // Pass 1: mark grouped virtual methods for renaming and settle
            // everything that has to be skipped.
            for t in 0..self.set.modules[m].types.len() {
                for mi in 0..self.set.modules[m].types[t].methods.len() {
                    self.decide_method(&mut base_sig_names, m, t, mi);
                }

                // Pull inherited names into this type's buckets so group
                // naming in later types cannot step on them.
                self.merge_ancestor_buckets(&mut base_sig_names, m, t);
            }

            // Between the passes, sweep the merge once more: group names
            // decided after a type was scanned still have to land in that
            // type's buckets before pass 2 mints from them.
            for t in 0..self.set.modules[m].types.len() {
                self.merge_ancestor_buckets(&mut base_sig_names, m, t);
            }

            // Pass 2: marked virtuals and anything not skipped get renamed.
            for t in 0..self.set.modules[m].types.len() {
                for mi in 0..self.set.modules[m].types[t].methods.len() {
                    self.apply_method(&mut base_sig_names, m, t, mi);
                }
            }
        }
    }

    /// Merges every ancestor bucket (same signature) into the type's own
    /// bucket so minted names never shadow an inherited, still-visible one.
    fn merge_ancestor_buckets(&self, base_sig_names: &mut BaseSigNames, m: ModuleId, t: TypeId) {
        let type_key = self.original_type_key(m, t);
        let ancestors: Vec<TypeKey> = self.inherit.base_types(&type_key).to_vec();
        for ancestor in ancestors {
            if let Some(base_map) = base_sig_names.get(&ancestor).cloned() {
                let own = base_sig_names.entry(type_key.clone()).or_default();
                for (sig, group) in base_map {
                    own.entry(sig).or_default().add_all(&group);
                }
            }
        }
    }

    /// Computes the provisional decision for one method.
    fn decide_method(
        &mut self,
        base_sig_names: &mut BaseSigNames,
        m: ModuleId,
        t: TypeId,
        mi: usize,
    ) {
        let type_key = self.original_type_key(m, t);
        let (key, is_virtual, is_special, semantics) = {
            let ty = &self.set.modules[m].types[t];
            let method = &ty.methods[mi];
            (
                MethodKey::of(type_key, method),
                method.is_virtual,
                method.is_special_name,
                method.semantics,
            )
        };

        let mut skip: Option<String> = None;
        if !self.should_rename_type(m, t) {
            skip = Some("ObfuscateAttribute found on type".into());
        }
        {
            let ty = &self.set.modules[m].types[t];
            if ty.methods[mi].is_runtime {
                skip = Some("runtime method".into());
            }
            if self.project.should_skip_method(&key)
                || !Self::should_obfuscate(&ty.methods[mi].attributes, &ty.attributes)
            {
                skip = Some("filtered".into());
            }
        }

        // Non-virtual methods are settled now; virtual decisions go through
        // the method group below.
        if !is_virtual {
            if let Some(reason) = skip {
                self.map.update_method(key, ObfuscationStatus::Skipped(reason));
            }
            return;
        }

        if is_special {
            match semantics {
                MethodSemantics::Getter | MethodSemantics::Setter => {
                    if !self.project.settings.rename_properties {
                        skip = Some("skipping properties".into());
                    }
                }
                MethodSemantics::AddOn | MethodSemantics::RemoveOn => {
                    if !self.project.settings.rename_events {
                        skip = Some("skipping events".into());
                    }
                }
                MethodSemantics::None => {
                    skip = Some("virtual and special name".into());
                }
            }
        }

        let status = self.map.method_status(&key);
        if (skip.is_some() && !status.is_skipped()) || status.is_unknown() {
            self.rename_virtual_method(base_sig_names, key, skip);
        }
    }

    /// Resolves a virtual method's group: names an unnamed group, un-names a
    /// named group that just acquired a skip reason, or checks consistency.
    fn rename_virtual_method(
        &mut self,
        base_sig_names: &mut BaseSigNames,
        key: MethodKey,
        mut skip: Option<String>,
    ) {
        let Some(gid) = self.inherit.group_id(&key) else {
            // No override relationship; only a skip decision can apply here,
            // renaming happens in pass 2 through the type's own bucket.
            if let Some(reason) = skip {
                self.map.update_method(key, ObfuscationStatus::Skipped(reason));
            }
            return;
        };

        let (group_name, external, members) = {
            let group = self.inherit.group(gid);
            (group.name.clone(), group.external, group.methods.clone())
        };
        let sig = key.sig.clone();
        let type_keys = {
            let mut out: Vec<TypeKey> = Vec::new();
            for member in &members {
                if !out.contains(&member.type_key) {
                    out.push(member.type_key.clone());
                }
            }
            out
        };

        match group_name {
            None => {
                if external {
                    skip = Some("external base class or interface".into());
                }
                let new_name = if skip.is_some() {
                    // the group keeps the original method name
                    key.name.clone()
                } else {
                    let buckets: Vec<&NameGroup> = type_keys
                        .iter()
                        .filter_map(|tk| base_sig_names.get(tk).and_then(|sn| sn.get(&sig)))
                        .collect();
                    NameGroup::next_across(&buckets, &self.maker)
                };
                self.inherit.set_group_name(gid, new_name.clone());
                for member in &members {
                    match &skip {
                        None => self.map.update_method(
                            member.clone(),
                            ObfuscationStatus::WillRename(new_name.clone()),
                        ),
                        Some(reason) => self
                            .map
                            .update_method(member.clone(), ObfuscationStatus::Skipped(reason.clone())),
                    }
                }
                for tk in &type_keys {
                    base_sig_names
                        .entry(tk.clone())
                        .or_default()
                        .entry(sig.clone())
                        .or_default()
                        .add(&new_name);
                }
            }
            Some(old_name) => {
                if let Some(reason) = skip {
                    // The group was named before this member surfaced a skip
                    // reason; reclaim the name and re-decide as the original.
                    assert!(
                        !external,
                        "external groups are decided when first seen and their members already skipped"
                    );
                    for tk in &type_keys {
                        if let Some(group) =
                            base_sig_names.get_mut(tk).and_then(|sn| sn.get_mut(&sig))
                        {
                            group.remove(&old_name);
                        }
                    }
                    let new_name = key.name.clone();
                    self.inherit.set_group_name(gid, new_name.clone());
                    for member in &members {
                        self.map
                            .update_method(member.clone(), ObfuscationStatus::Skipped(reason.clone()));
                    }
                    for tk in &type_keys {
                        base_sig_names
                            .entry(tk.clone())
                            .or_default()
                            .entry(sig.clone())
                            .or_default()
                            .add(&new_name);
                    }
                } else {
                    let status = self.map.method_status(&key);
                    assert!(
                        status.is_skipped() || status.text() == Some(old_name.as_str()),
                        "named group out of sync with the ledger for {}",
                        key.fullname()
                    );
                }
            }
        }
    }

    /// Applies one resolved decision in pass 2.
    fn apply_method(
        &mut self,
        base_sig_names: &mut BaseSigNames,
        m: ModuleId,
        t: TypeId,
        mi: usize,
    ) {
        let type_key = self.original_type_key(m, t);
        let (key, is_special, semantics) = {
            let ty = &self.set.modules[m].types[t];
            let method = &ty.methods[mi];
            (
                MethodKey::of(type_key, method),
                method.is_special_name,
                method.semantics,
            )
        };

        if self.map.method_status(&key).is_skipped() {
            return;
        }

        if is_special {
            match semantics {
                MethodSemantics::Getter | MethodSemantics::Setter => {
                    if self.project.settings.rename_properties {
                        self.rename_method(base_sig_names, m, t, mi, key);
                        self.set.modules[m].types[t].methods[mi].semantics =
                            MethodSemantics::None;
                    } else {
                        self.map.update_method(
                            key,
                            ObfuscationStatus::Skipped("skipping properties".into()),
                        );
                    }
                }
                MethodSemantics::AddOn | MethodSemantics::RemoveOn => {
                    if self.project.settings.rename_events {
                        self.rename_method(base_sig_names, m, t, mi, key);
                        self.set.modules[m].types[t].methods[mi].semantics =
                            MethodSemantics::None;
                    } else {
                        self.map.update_method(
                            key,
                            ObfuscationStatus::Skipped("skipping events".into()),
                        );
                    }
                }
                MethodSemantics::None => {
                    // operator overloads and other compiler-recognized names
                    self.map
                        .update_method(key, ObfuscationStatus::Skipped("special name".into()));
                }
            }
        } else {
            self.rename_method(base_sig_names, m, t, mi, key);
        }
    }

    /// Renames one method, minting from its (type, signature) bucket when no
    /// group already decided a name.
    fn rename_method(
        &mut self,
        base_sig_names: &mut BaseSigNames,
        m: ModuleId,
        t: TypeId,
        mi: usize,
        key: MethodKey,
    ) {
        let status = self.map.method_status(&key);
        let new_name = match status {
            ObfuscationStatus::Renamed(name) | ObfuscationStatus::WillRename(name) => name,
            ObfuscationStatus::Skipped(_) => return,
            ObfuscationStatus::Unknown => {
                let group = base_sig_names
                    .entry(key.type_key.clone())
                    .or_default()
                    .entry(key.sig.clone())
                    .or_default();
                let name = group.get_next(&self.maker);
                group.add(&name);
                self.map
                    .update_method(key.clone(), ObfuscationStatus::WillRename(name.clone()));
                name
            }
        };

        let current = MethodKey::new(self.set.type_key(m, t), key.name.clone(), key.sig.clone());
        for r in self.referencing_modules(m) {
            self.set.modules[r].retarget_method_refs(&current, &new_name);
        }
        self.set.modules[m].types[t].methods[mi].name = new_name.clone();
        self.map
            .update_method(key, ObfuscationStatus::Renamed(new_name));
    }
}
