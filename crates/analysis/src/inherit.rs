//! Cross-module virtual-method grouping.
//!
//! Virtual dispatch constrains renaming: every method in the transitive
//! closure of "overrides or implements" relationships for one signature must
//! end up with the identical name, or all keep their original one. The
//! closure is a plain partition problem, so it is computed once up front
//! with a union-find over every virtual method in every loaded module —
//! including modules that are not under transformation, which contribute
//! `external` marking only.

use petgraph::unionfind::UnionFind;
use std::collections::HashMap;
use tracing::debug;
use umbra_core::keys::{MethodKey, ParamSig, TypeKey};
use umbra_core::model::{ModuleId, ModuleSet, TypeId};

/// One partition of virtual methods that must share a name.
#[derive(Debug, Clone)]
pub struct MethodGroup {
    /// The shared name, once decided by the rename engine.
    pub name: Option<String>,
    /// Sticky: true if any member's declaring module is outside the
    /// transformable set.
    pub external: bool,
    pub methods: Vec<MethodKey>,
}

/// Inheritance facts computed once per run: the method-group partition and
/// the transitive ancestor closure per type.
#[derive(Debug, Default)]
pub struct InheritMap {
    groups: Vec<MethodGroup>,
    by_method: HashMap<MethodKey, usize>,
    base_types: HashMap<TypeKey, Vec<TypeKey>>,
}

impl InheritMap {
    /// Builds the map from the full module set, before any renaming.
    pub fn build(set: &ModuleSet) -> Self {
        let mut type_index: HashMap<TypeKey, (ModuleId, TypeId)> = HashMap::new();
        for (m, module) in set.modules.iter().enumerate() {
            for t in 0..module.types.len() {
                type_index.insert(set.type_key(m, t), (m, t));
            }
        }

        // Transitive ancestor closure per type: base chain plus interfaces,
        // expanded through every ancestor resolvable inside the set.
        let mut base_types: HashMap<TypeKey, Vec<TypeKey>> = HashMap::new();
        for (m, module) in set.modules.iter().enumerate() {
            for t in 0..module.types.len() {
                let key = set.type_key(m, t);
                let mut seen = Vec::new();
                let mut queue: Vec<TypeKey> = Vec::new();
                let ty = &module.types[t];
                queue.extend(ty.base.iter().cloned());
                queue.extend(ty.interfaces.iter().cloned());
                while let Some(ancestor) = queue.pop() {
                    if seen.contains(&ancestor) {
                        continue;
                    }
                    if let Some(&(am, at)) = type_index.get(&ancestor) {
                        let aty = &set.modules[am].types[at];
                        queue.extend(aty.base.iter().cloned());
                        queue.extend(aty.interfaces.iter().cloned());
                    }
                    seen.push(ancestor);
                }
                base_types.insert(key, seen);
            }
        }

        // Every virtual method in the set, in deterministic declaration
        // order, with a per-type signature lookup for override matching.
        let mut methods: Vec<(MethodKey, bool)> = Vec::new();
        let mut method_index: HashMap<MethodKey, usize> = HashMap::new();
        let mut by_type: HashMap<TypeKey, Vec<usize>> = HashMap::new();
        for (m, module) in set.modules.iter().enumerate() {
            for t in 0..module.types.len() {
                let type_key = set.type_key(m, t);
                for method in &module.types[t].methods {
                    if !method.is_virtual {
                        continue;
                    }
                    let key = MethodKey::of(type_key.clone(), method);
                    let idx = methods.len();
                    methods.push((key.clone(), module.external));
                    method_index.insert(key, idx);
                    by_type.entry(type_key.clone()).or_default().push(idx);
                }
            }
        }

        // Union each virtual method with every matching virtual method in
        // every ancestor type.
        let mut uf = UnionFind::<usize>::new(methods.len());
        for (m, module) in set.modules.iter().enumerate() {
            for t in 0..module.types.len() {
                let type_key = set.type_key(m, t);
                let Some(ancestors) = base_types.get(&type_key) else {
                    continue;
                };
                let own: Vec<usize> = by_type.get(&type_key).cloned().unwrap_or_default();
                for ancestor in ancestors {
                    let Some(theirs) = by_type.get(ancestor) else {
                        continue;
                    };
                    for &mine in &own {
                        let (mine_key, _) = &methods[mine];
                        for &other in theirs {
                            let (other_key, _) = &methods[other];
                            if mine_key.name == other_key.name && mine_key.sig == other_key.sig {
                                uf.union(mine, other);
                            }
                        }
                    }
                }
            }
        }

        // Materialize groups for components with more than one member.
        let mut members_by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..methods.len() {
            members_by_root.entry(uf.find(i)).or_default().push(i);
        }
        let mut groups = Vec::new();
        let mut by_method = HashMap::new();
        // Walk in method order so group ids are deterministic.
        for i in 0..methods.len() {
            let root = uf.find(i);
            let Some(members) = members_by_root.remove(&root) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }
            let gid = groups.len();
            let external = members.iter().any(|&j| methods[j].1);
            let keys: Vec<MethodKey> = members.iter().map(|&j| methods[j].0.clone()).collect();
            for key in &keys {
                by_method.insert(key.clone(), gid);
            }
            groups.push(MethodGroup {
                name: None,
                external,
                methods: keys,
            });
        }

        debug!(
            "inheritance graph: {} virtual methods, {} groups",
            methods.len(),
            groups.len()
        );

        Self {
            groups,
            by_method,
            base_types,
        }
    }

    /// The group a method belongs to, if it participates in any override or
    /// interface-implementation relationship.
    pub fn group_of(&self, key: &MethodKey) -> Option<&MethodGroup> {
        self.by_method.get(key).map(|&gid| &self.groups[gid])
    }

    pub fn group_id(&self, key: &MethodKey) -> Option<usize> {
        self.by_method.get(key).copied()
    }

    pub fn group(&self, id: usize) -> &MethodGroup {
        &self.groups[id]
    }

    pub fn set_group_name(&mut self, id: usize, name: String) {
        self.groups[id].name = Some(name);
    }

    /// Transitive ancestor closure of a type (base classes and interfaces).
    pub fn base_types(&self, key: &TypeKey) -> &[TypeKey] {
        self.base_types.get(key).map_or(&[], Vec::as_slice)
    }

    /// Distinct declaring types of a group's members, in member order. The
    /// engine uses this to touch every name bucket a shared name must enter.
    pub fn group_type_keys(group: &MethodGroup) -> Vec<TypeKey> {
        let mut out: Vec<TypeKey> = Vec::new();
        for m in &group.methods {
            if !out.contains(&m.type_key) {
                out.push(m.type_key.clone());
            }
        }
        out
    }

    /// Signature shared by a group's members.
    pub fn group_sig(group: &MethodGroup) -> ParamSig {
        group
            .methods
            .first()
            .map(|m| m.sig.clone())
            .unwrap_or_default()
    }
}
