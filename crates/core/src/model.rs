//! Arena-indexed model of a set of managed modules under transformation.
//!
//! The metadata reader normally hands back a live object graph in which a
//! reference held by module A aliases a definition in module B. That aliasing
//! is re-expressed here with plain indices: every module owns a table of
//! type-ref entries and a table of member-ref entries, member refs point at
//! their declaring type-ref entry by index, and instructions point at member
//! refs or at internal `(type, method)` slots. Retargeting one type-ref entry
//! is therefore visible through every member ref that goes through it.
//!
//! Each module also carries a worklist of still-unresolved references plus a
//! `referenced_by` adjacency. Renaming a definition asks every referencing
//! module to scan its worklist; a matching entry is retargeted and removed so
//! it is never revisited. Entries left over after all passes point at
//! symbols that were skipped or live outside the transformable set.

use crate::keys::{EventKey, FieldKey, MethodKey, PropertyKey, TypeKey};
use serde::{Deserialize, Serialize};

pub type ModuleId = usize;
pub type TypeId = usize;

/// Position of a method definition inside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSlot {
    pub ty: TypeId,
    pub method: usize,
}

/// Accessor role recorded in a method's semantics row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodSemantics {
    #[default]
    None,
    Getter,
    Setter,
    AddOn,
    RemoveOn,
}

/// A constant argument captured inside a custom attribute application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Str(String),
}

/// Named (property-style) argument of a custom attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    /// Declared type of the argument, e.g. `System.Type` for type literals.
    pub arg_type: String,
    pub value: AttrValue,
}

/// A custom attribute application with its declared constructor signature.
///
/// `ctor_sig` carries the declared parameter types, which is what makes
/// type-name-valued positions recognizable without executing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    pub ctor_type: String,
    #[serde(default)]
    pub ctor_sig: Vec<String>,
    #[serde(default)]
    pub ctor_args: Vec<AttrValue>,
    #[serde(default)]
    pub named_args: Vec<NamedArg>,
}

impl CustomAttribute {
    pub fn new(ctor_type: impl Into<String>) -> Self {
        Self {
            ctor_type: ctor_type.into(),
            ctor_sig: Vec::new(),
            ctor_args: Vec::new(),
            named_args: Vec::new(),
        }
    }

    /// Looks up a named argument by name.
    pub fn named_arg(&self, name: &str) -> Option<&AttrValue> {
        self.named_args
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

/// Debug line association carried by an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePoint {
    pub document: String,
    pub line: u32,
}

/// Target of a call instruction: a definition in this module, or an entry in
/// the member-ref table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallTarget {
    Slot(MethodSlot),
    Ref(usize),
}

/// The instruction alphabet the engine inspects or synthesizes. Anything it
/// only carries through is preserved as an opaque mnemonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    LdStr(String),
    Call(CallTarget),
    Ldc(i32),
    Ret,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    #[serde(default)]
    pub seq: Option<SequencePoint>,
}

impl Instruction {
    pub fn new(op: Opcode) -> Self {
        Self { op, seq: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    #[serde(default)]
    pub locals: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: String,
}

fn default_return_type() -> String {
    "System.Void".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_runtime: bool,
    #[serde(default)]
    pub is_special_name: bool,
    #[serde(default)]
    pub semantics: MethodSemantics,
    #[serde(default)]
    pub attributes: Vec<CustomAttribute>,
    #[serde(default)]
    pub body: Option<MethodBody>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: default_return_type(),
            generic_params: Vec::new(),
            is_public: false,
            is_virtual: false,
            is_runtime: false,
            is_special_name: false,
            semantics: MethodSemantics::None,
            attributes: Vec::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Field-type signature, frozen at load time.
    pub signature: String,
    #[serde(default)]
    pub is_runtime_special: bool,
    #[serde(default)]
    pub attributes: Vec<CustomAttribute>,
    /// Raw initial value for mapped-data fields (string blobs).
    #[serde(default)]
    pub initial_value: Option<Vec<u8>>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            is_runtime_special: false,
            attributes: Vec::new(),
            initial_value: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub prop_type: String,
    #[serde(default)]
    pub getter: Option<usize>,
    #[serde(default)]
    pub setter: Option<usize>,
    #[serde(default)]
    pub is_runtime_special: bool,
    #[serde(default)]
    pub attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, prop_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prop_type: prop_type.into(),
            getter: None,
            setter: None,
            is_runtime_special: false,
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub event_type: String,
    #[serde(default)]
    pub add: Option<usize>,
    #[serde(default)]
    pub remove: Option<usize>,
    #[serde(default)]
    pub is_runtime_special: bool,
    #[serde(default)]
    pub attributes: Vec<CustomAttribute>,
}

impl EventDef {
    pub fn new(name: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_type: event_type.into(),
            add: None,
            remove: None,
            is_runtime_special: false,
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Declaring type for nested types. Nested types have no namespace of
    /// their own in the binary format.
    #[serde(default)]
    pub declaring: Option<TypeId>,
    /// Base type, frozen original identity.
    #[serde(default)]
    pub base: Option<TypeKey>,
    #[serde(default)]
    pub interfaces: Vec<TypeKey>,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub attributes: Vec<CustomAttribute>,
}

impl TypeDef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declaring: None,
            base: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// A manifest resource owned by a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
}

/// One entry in a module's type-reference table. Nested-type entries chain to
/// their enclosing entry; the scope and namespace of a chained entry come
/// from its root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRefEntry {
    pub scope: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub declaring: Option<usize>,
}

/// One entry in a module's member-reference table. The declaring type is an
/// index into the type-ref table, so retargeting the type ref retargets the
/// member ref's type at the same time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MemberRefEntry {
    Field {
        type_ref: usize,
        name: String,
        signature: String,
    },
    Method {
        type_ref: usize,
        name: String,
        params: Vec<String>,
    },
    Property {
        type_ref: usize,
        name: String,
        prop_type: String,
    },
    Event {
        type_ref: usize,
        name: String,
        event_type: String,
    },
}

impl MemberRefEntry {
    fn name_mut(&mut self) -> &mut String {
        match self {
            Self::Field { name, .. }
            | Self::Method { name, .. }
            | Self::Property { name, .. }
            | Self::Event { name, .. } => name,
        }
    }
}

/// One string folded into a module's encoded blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenString {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
    pub accessor: MethodSlot,
}

/// Per-module record of the string-hiding transform's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenStrings {
    pub container: TypeId,
    pub blob: Vec<u8>,
    pub entries: Vec<HiddenString>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// External modules participate in inheritance analysis but are never
    /// transformed.
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub type_refs: Vec<TypeRefEntry>,
    #[serde(default)]
    pub member_refs: Vec<MemberRefEntry>,
    #[serde(default)]
    pub unresolved_type_refs: Vec<usize>,
    #[serde(default)]
    pub unresolved_member_refs: Vec<usize>,
    #[serde(default)]
    pub referenced_by: Vec<ModuleId>,
    #[serde(default)]
    pub hidden_strings: Option<HiddenStrings>,
}

/// Builds the structural identity of a type-ref entry by walking its
/// declaring chain: the name path is `/`-joined child-last, scope and
/// namespace come from the chain's root.
pub fn type_ref_key(type_refs: &[TypeRefEntry], mut idx: usize) -> TypeKey {
    let mut parts = vec![type_refs[idx].name.clone()];
    while let Some(outer) = type_refs[idx].declaring {
        idx = outer;
        parts.push(type_refs[idx].name.clone());
    }
    parts.reverse();
    TypeKey::new(
        type_refs[idx].scope.clone(),
        type_refs[idx].namespace.clone(),
        parts.join("/"),
    )
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external: false,
            types: Vec::new(),
            resources: Vec::new(),
            type_refs: Vec::new(),
            member_refs: Vec::new(),
            unresolved_type_refs: Vec::new(),
            unresolved_member_refs: Vec::new(),
            referenced_by: Vec::new(),
            hidden_strings: None,
        }
    }

    /// Retargets every unresolved type ref matching `target` to the new
    /// namespace and (simple) name, removing it from the worklist. Member
    /// refs through the entry follow automatically. Returns the number of
    /// entries retargeted.
    pub fn retarget_type_refs(
        &mut self,
        target: &TypeKey,
        new_namespace: &str,
        new_name: &str,
    ) -> usize {
        let matched: Vec<usize> = self
            .unresolved_type_refs
            .iter()
            .copied()
            .filter(|&idx| type_ref_key(&self.type_refs, idx) == *target)
            .collect();
        for &idx in &matched {
            let entry = &mut self.type_refs[idx];
            entry.namespace = new_namespace.to_owned();
            entry.name = new_name.to_owned();
        }
        self.unresolved_type_refs.retain(|i| !matched.contains(i));
        matched.len()
    }

    fn retarget_member_refs(&mut self, matched: Vec<usize>, new_name: &str) -> usize {
        for &idx in &matched {
            *self.member_refs[idx].name_mut() = new_name.to_owned();
        }
        self.unresolved_member_refs.retain(|i| !matched.contains(i));
        matched.len()
    }

    /// Retargets unresolved field refs whose structural key matches.
    pub fn retarget_field_refs(&mut self, key: &FieldKey, new_name: &str) -> usize {
        let matched: Vec<usize> = self
            .unresolved_member_refs
            .iter()
            .copied()
            .filter(|&idx| match &self.member_refs[idx] {
                MemberRefEntry::Field {
                    type_ref,
                    name,
                    signature,
                } => {
                    name == &key.name
                        && signature == &key.signature
                        && type_ref_key(&self.type_refs, *type_ref) == key.type_key
                }
                _ => false,
            })
            .collect();
        self.retarget_member_refs(matched, new_name)
    }

    /// Retargets unresolved method refs whose structural key matches.
    pub fn retarget_method_refs(&mut self, key: &MethodKey, new_name: &str) -> usize {
        let matched: Vec<usize> = self
            .unresolved_member_refs
            .iter()
            .copied()
            .filter(|&idx| match &self.member_refs[idx] {
                MemberRefEntry::Method {
                    type_ref,
                    name,
                    params,
                } => {
                    name == &key.name
                        && params == &key.sig.params
                        && type_ref_key(&self.type_refs, *type_ref) == key.type_key
                }
                _ => false,
            })
            .collect();
        self.retarget_member_refs(matched, new_name)
    }

    /// Retargets unresolved property refs whose structural key matches.
    pub fn retarget_property_refs(&mut self, key: &PropertyKey, new_name: &str) -> usize {
        let matched: Vec<usize> = self
            .unresolved_member_refs
            .iter()
            .copied()
            .filter(|&idx| match &self.member_refs[idx] {
                MemberRefEntry::Property {
                    type_ref,
                    name,
                    prop_type,
                } => {
                    name == &key.name
                        && prop_type == &key.prop_type
                        && type_ref_key(&self.type_refs, *type_ref) == key.type_key
                }
                _ => false,
            })
            .collect();
        self.retarget_member_refs(matched, new_name)
    }

    /// Retargets unresolved event refs whose structural key matches.
    pub fn retarget_event_refs(&mut self, key: &EventKey, new_name: &str) -> usize {
        let matched: Vec<usize> = self
            .unresolved_member_refs
            .iter()
            .copied()
            .filter(|&idx| match &self.member_refs[idx] {
                MemberRefEntry::Event {
                    type_ref,
                    name,
                    event_type,
                } => {
                    name == &key.name
                        && event_type == &key.event_type
                        && type_ref_key(&self.type_refs, *type_ref) == key.type_key
                }
                _ => false,
            })
            .collect();
        self.retarget_member_refs(matched, new_name)
    }
}

/// The full set of modules a run operates on, transformable and external.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSet {
    pub modules: Vec<Module>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, module: Module) -> ModuleId {
        self.modules.push(module);
        self.modules.len() - 1
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.modules.iter().position(|m| m.name == name)
    }

    /// Current structural identity of a type definition, walking the
    /// declaring chain for nested types.
    pub fn type_key(&self, m: ModuleId, t: TypeId) -> TypeKey {
        let module = &self.modules[m];
        let mut idx = t;
        let mut parts = vec![module.types[idx].name.clone()];
        while let Some(outer) = module.types[idx].declaring {
            idx = outer;
            parts.push(module.types[idx].name.clone());
        }
        parts.reverse();
        TypeKey::new(
            module.name.clone(),
            module.types[idx].namespace.clone(),
            parts.join("/"),
        )
    }

    /// Finds a type definition by its current structural identity.
    pub fn find_type(&self, key: &TypeKey) -> Option<(ModuleId, TypeId)> {
        let m = self.module_id(&key.scope)?;
        (0..self.modules[m].types.len())
            .find(|&t| self.type_key(m, t) == *key)
            .map(|t| (m, t))
    }

    /// Wires `referenced_by` adjacency from type-ref scopes and seeds every
    /// module's unresolved worklists with all of its reference entries.
    pub fn link(&mut self) {
        for module in &mut self.modules {
            module.unresolved_type_refs = (0..module.type_refs.len()).collect();
            module.unresolved_member_refs = (0..module.member_refs.len()).collect();
            module.referenced_by.clear();
        }
        for i in 0..self.modules.len() {
            let mut scopes: Vec<String> = self.modules[i]
                .type_refs
                .iter()
                .filter(|r| r.declaring.is_none())
                .map(|r| r.scope.clone())
                .collect();
            scopes.sort();
            scopes.dedup();
            for scope in scopes {
                if let Some(j) = self.module_id(&scope) {
                    if j != i {
                        self.modules[j].referenced_by.push(i);
                    }
                }
            }
        }
        for module in &mut self.modules {
            module.referenced_by.sort_unstable();
            module.referenced_by.dedup();
        }
    }
}
