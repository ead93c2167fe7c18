//! Project description: global settings, per-module skip rules, and module
//! fixture loading.
//!
//! The project file is JSON. Settings default the way the original tool
//! shipped: member renaming and string hiding on, marked-only and unicode
//! names off. Skip rules are exact names or trailing-`*` prefixes, matched
//! against pre-rename identities. Accessor methods can additionally be
//! force-skipped at runtime so they stay in sync with their owning property
//! or event decision.

use crate::keys::{EventKey, FieldKey, MethodKey, PropertyKey, TypeKey};
use crate::model::{Module, ModuleSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use umbra_utils::errors::{ConfigError, LoadError};

/// Global feature toggles and paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub in_path: String,
    pub out_path: String,
    /// Overrides the mapping report location when non-empty.
    pub log_file: String,
    pub marked_only: bool,
    pub rename_properties: bool,
    pub rename_events: bool,
    pub reuse_names: bool,
    pub use_unicode_names: bool,
    pub hide_strings: bool,
    pub json_mapping: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            in_path: ".".to_owned(),
            out_path: ".".to_owned(),
            log_file: String::new(),
            marked_only: false,
            rename_properties: true,
            rename_events: true,
            reuse_names: true,
            use_unicode_names: false,
            hide_strings: true,
            json_mapping: false,
        }
    }
}

/// Per-kind skip patterns: exact full names or trailing-`*` prefixes.
/// Member patterns use the `Namespace.Type::member` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipRules {
    pub types: Vec<String>,
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    pub events: Vec<String>,
}

fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns.iter().any(|p| match p.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => p == name,
    })
}

/// One module under transformation (or referenced externally).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSpec {
    /// Fixture file, relative to `in_path`. May be empty for in-memory sets.
    pub file: String,
    /// Module name; filled from the loaded module when empty.
    pub name: String,
    pub external: bool,
    pub skip: SkipRules,
    /// Method patterns excluded from string hiding.
    pub skip_strings: Vec<String>,
}

/// A whole obfuscation project: settings, module list, and the runtime
/// force-skip registrations used to keep accessors aligned with their
/// property or event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(skip)]
    forced: HashSet<MethodKey>,
}

impl Project {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            modules: Vec::new(),
            forced: HashSet::new(),
        }
    }

    /// Reads and validates a project file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a project description.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let project: Self = serde_json::from_str(text)?;
        project.check_settings()?;
        Ok(project)
    }

    /// Validates the configuration before any transformation starts.
    pub fn check_settings(&self) -> Result<(), ConfigError> {
        if self.settings.in_path.is_empty() {
            return Err(ConfigError::InvalidSetting("in_path is empty".into()));
        }
        if self.settings.out_path.is_empty() {
            return Err(ConfigError::InvalidSetting("out_path is empty".into()));
        }
        for spec in &self.modules {
            if spec.file.is_empty() && spec.name.is_empty() {
                return Err(ConfigError::InvalidSetting(
                    "module spec has neither file nor name".into(),
                ));
            }
        }
        Ok(())
    }

    /// Loads every module fixture listed in the project and links the set.
    pub fn load_modules(&mut self) -> Result<ModuleSet, LoadError> {
        let mut set = ModuleSet::new();
        let mut seen = HashSet::new();
        for spec in &mut self.modules {
            let path = PathBuf::from(&self.settings.in_path).join(&spec.file);
            let text = fs::read_to_string(&path).map_err(|source| LoadError::FileRead {
                path: path.display().to_string(),
                source,
            })?;
            let mut module: Module =
                serde_json::from_str(&text).map_err(|source| LoadError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            module.external = spec.external;
            if spec.name.is_empty() {
                spec.name = module.name.clone();
            }
            if !seen.insert(module.name.clone()) {
                return Err(LoadError::DuplicateModule(module.name));
            }
            set.push(module);
        }
        set.link();
        info!("loaded {} modules", set.modules.len());
        Ok(set)
    }

    fn rules_for(&self, scope: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|s| s.name == scope)
    }

    pub fn should_skip_type(&self, key: &TypeKey) -> bool {
        self.rules_for(&key.scope)
            .is_some_and(|s| matches_any(&s.skip.types, &key.fullname()))
    }

    pub fn should_skip_field(&self, key: &FieldKey) -> bool {
        self.rules_for(&key.type_key.scope)
            .is_some_and(|s| matches_any(&s.skip.fields, &key.fullname()))
    }

    pub fn should_skip_method(&self, key: &MethodKey) -> bool {
        if self.forced.contains(key) {
            return true;
        }
        self.rules_for(&key.type_key.scope).is_some_and(|s| {
            matches_any(
                &s.skip.methods,
                &format!("{}::{}", key.type_key.fullname(), key.name),
            )
        })
    }

    pub fn should_skip_property(&self, key: &PropertyKey) -> bool {
        self.rules_for(&key.type_key.scope)
            .is_some_and(|s| matches_any(&s.skip.properties, &key.fullname()))
    }

    pub fn should_skip_event(&self, key: &EventKey) -> bool {
        self.rules_for(&key.type_key.scope)
            .is_some_and(|s| matches_any(&s.skip.events, &key.fullname()))
    }

    pub fn should_skip_string_hiding(&self, key: &MethodKey) -> bool {
        self.rules_for(&key.type_key.scope).is_some_and(|s| {
            matches_any(
                &s.skip_strings,
                &format!("{}::{}", key.type_key.fullname(), key.name),
            )
        })
    }

    /// Registers a method to be skipped regardless of other rules. Used to
    /// keep accessors in sync with their owning property or event decision.
    pub fn force_skip(&mut self, key: MethodKey) {
        self.forced.insert(key);
    }
}
