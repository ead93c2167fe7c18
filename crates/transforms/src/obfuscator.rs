//! The run context and pipeline driver.
//!
//! One `Obfuscator` owns the project, the module set, the status ledger, the
//! inheritance graph, and the unique-name counters for exactly one run.
//! Pass ordering is load-bearing: member identity tables and the inherited
//! name buckets the method pass depends on are built by the earlier passes,
//! attribute-literal patching needs the full old→new type table, and string
//! hiding needs final, stable type and method membership.

use crate::name_maker::NameMaker;
use std::collections::HashMap;
use tracing::info;
use umbra_analysis::InheritMap;
use umbra_core::keys::{MethodKey, TypeKey};
use umbra_core::map::ObfuscationMap;
use umbra_core::model::{AttrValue, CustomAttribute, ModuleId, ModuleSet, TypeId};
use umbra_core::project::Project;
use umbra_utils::errors::ObfuscateError;

/// Full name of the standard per-symbol opt-out attribute.
pub const OBFUSCATION_ATTRIBUTE: &str = "System.Reflection.ObfuscationAttribute";

/// Full name of the mark attribute honored in marked-only mode.
pub const MARK_ATTRIBUTE: &str = "Umbra.ObfuscateAttribute";

/// Parsed view of the standard opt-out attribute.
#[derive(Debug, Clone, Default)]
pub struct ObfuscationAttr {
    pub exclude: bool,
    pub apply_to_members: bool,
    pub strip: bool,
    pub feature: Option<String>,
}

pub struct Obfuscator {
    pub project: Project,
    pub set: ModuleSet,
    pub(crate) map: ObfuscationMap,
    pub(crate) inherit: InheritMap,
    /// Pre-rename identity of every type, snapshotted before any pass runs.
    /// Member keys recorded in the ledger derive from these, so the report
    /// stays stable even though the type pass runs before the member passes.
    original_type_keys: HashMap<(ModuleId, TypeId), TypeKey>,
    /// Pre-rename identity of every method, for predicates that run after
    /// renaming but whose configuration is written against source names.
    original_method_keys: HashMap<(ModuleId, TypeId, usize), MethodKey>,
    pub(crate) maker: NameMaker,
    pub(crate) unique_type_index: usize,
    pub(crate) unique_member_index: usize,
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator")
            .field("modules", &self.set.modules.len())
            .field("decisions", &self.map.len())
            .finish()
    }
}

impl Obfuscator {
    /// Builds a run context over an already-loaded module set.
    pub fn new(project: Project, set: ModuleSet) -> Self {
        let inherit = InheritMap::build(&set);
        let mut original_type_keys = HashMap::new();
        let mut original_method_keys = HashMap::new();
        for m in 0..set.modules.len() {
            for t in 0..set.modules[m].types.len() {
                let type_key = set.type_key(m, t);
                for (mi, method) in set.modules[m].types[t].methods.iter().enumerate() {
                    original_method_keys.insert((m, t, mi), MethodKey::of(type_key.clone(), method));
                }
                original_type_keys.insert((m, t), type_key);
            }
        }
        let maker = NameMaker::new(project.settings.use_unicode_names);
        Self {
            project,
            set,
            map: ObfuscationMap::new(),
            inherit,
            original_type_keys,
            original_method_keys,
            maker,
            unique_type_index: 0,
            unique_member_index: 0,
        }
    }

    /// Loads the project's module fixtures and builds the run context.
    pub fn from_project(mut project: Project) -> Result<Self, ObfuscateError> {
        project.check_settings()?;
        let set = project.load_modules()?;
        Ok(Self::new(project, set))
    }

    /// Runs every pass in pipeline order.
    pub fn run(&mut self) {
        info!("renaming fields");
        self.rename_fields();
        info!("renaming parameters");
        self.rename_params();
        info!("renaming types and resources");
        self.rename_types();
        info!("renaming properties");
        self.rename_properties();
        info!("renaming events");
        self.rename_events();
        info!("renaming methods");
        self.rename_methods();
        info!("hiding strings");
        self.hide_strings();
        self.strip_marked_attributes();
        info!("run complete: {} symbols decided", self.map.len());
    }

    /// The status ledger. Read-only outside the engine; the map is the sole
    /// source of truth for the mapping report.
    pub fn map(&self) -> &ObfuscationMap {
        &self.map
    }

    /// Pre-rename identity of a type definition.
    pub(crate) fn original_type_key(&self, m: ModuleId, t: TypeId) -> TypeKey {
        self.original_type_keys[&(m, t)].clone()
    }

    /// Pre-rename identity of a method definition.
    pub(crate) fn original_method_key(&self, m: ModuleId, t: TypeId, mi: usize) -> MethodKey {
        self.original_method_keys[&(m, t, mi)].clone()
    }

    pub(crate) fn referencing_modules(&self, m: ModuleId) -> Vec<ModuleId> {
        self.set.modules[m].referenced_by.clone()
    }

    /// Whether a type is eligible for renaming at all. Defaults to yes
    /// unless the project runs in marked-only mode; an explicit mark
    /// attribute overrides either way.
    pub(crate) fn should_rename_type(&self, m: ModuleId, t: TypeId) -> bool {
        let ty = &self.set.modules[m].types[t];
        let mut should = !self.project.settings.marked_only;
        if let Some(attr) = ty.attributes.iter().find(|a| a.ctor_type == MARK_ATTRIBUTE) {
            should = match attr.named_arg("ShouldObfuscate") {
                Some(AttrValue::Bool(b)) => *b,
                _ => true,
            };
        }
        should
    }

    /// Parses the standard opt-out attribute from an attribute list.
    pub(crate) fn obfuscation_attr(attrs: &[CustomAttribute]) -> Option<ObfuscationAttr> {
        let attr = attrs.iter().find(|a| a.ctor_type == OBFUSCATION_ATTRIBUTE)?;
        let mut parsed = ObfuscationAttr::default();
        if let Some(AttrValue::Bool(b)) = attr.named_arg("Exclude") {
            parsed.exclude = *b;
        }
        if let Some(AttrValue::Bool(b)) = attr.named_arg("ApplyToMembers") {
            parsed.apply_to_members = *b;
        }
        if let Some(AttrValue::Bool(b)) = attr.named_arg("StripAfterObfuscation") {
            parsed.strip = *b;
        }
        if let Some(AttrValue::Str(s)) = attr.named_arg("Feature") {
            parsed.feature = Some(s.clone());
        }
        Some(parsed)
    }

    /// Member-level opt-out: the member's own attribute wins, then the
    /// declaring type's attribute when it applies to members.
    pub(crate) fn should_obfuscate(
        member_attrs: &[CustomAttribute],
        type_attrs: &[CustomAttribute],
    ) -> bool {
        if let Some(attr) = Self::obfuscation_attr(member_attrs) {
            if attr.exclude {
                return false;
            }
        }
        if let Some(attr) = Self::obfuscation_attr(type_attrs) {
            if attr.exclude && attr.apply_to_members {
                return false;
            }
        }
        true
    }

    /// Removes opt-out attributes that asked to be stripped once honored.
    pub(crate) fn strip_marked_attributes(&mut self) {
        let keep = |attrs: &mut Vec<CustomAttribute>| {
            attrs.retain(|a| {
                a.ctor_type != OBFUSCATION_ATTRIBUTE
                    || !matches!(
                        a.named_arg("StripAfterObfuscation"),
                        Some(AttrValue::Bool(true))
                    )
            });
        };
        for module in &mut self.set.modules {
            if module.external {
                continue;
            }
            for ty in &mut module.types {
                keep(&mut ty.attributes);
                for method in &mut ty.methods {
                    keep(&mut method.attributes);
                }
                for field in &mut ty.fields {
                    keep(&mut field.attributes);
                }
                for prop in &mut ty.properties {
                    keep(&mut prop.attributes);
                }
                for evt in &mut ty.events {
                    keep(&mut evt.attributes);
                }
            }
        }
    }
}
