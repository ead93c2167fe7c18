//! Per-symbol status ledger for one obfuscation run.
//!
//! The map is the sole source of truth for the mapping report. Entries are
//! created lazily on first touch and only ever move along the allowed
//! transitions: `Unknown → WillRename → Renamed`, or into `Skipped` from
//! anywhere. An illegal transition is an engine bug, not a user error, and
//! fails loudly rather than risking a semantically broken module.

use crate::keys::{EventKey, FieldKey, MethodKey, PropertyKey, TypeKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Decision state of one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObfuscationStatus {
    #[default]
    Unknown,
    /// Intentionally left alone; carries the reason.
    Skipped(String),
    /// A name has been decided but not yet applied.
    WillRename(String),
    /// The rename has been applied; carries the new name.
    Renamed(String),
}

impl ObfuscationStatus {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_renamed(&self) -> bool {
        matches!(self, Self::Renamed(_))
    }

    /// The attached payload: new name or skip reason.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Unknown => None,
            Self::Skipped(s) | Self::WillRename(s) | Self::Renamed(s) => Some(s),
        }
    }
}

/// Any symbol the map can track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKey {
    Type(TypeKey),
    Field(FieldKey),
    Method(MethodKey),
    Property(PropertyKey),
    Event(EventKey),
}

impl SymbolKey {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Type(_) => "type",
            Self::Field(_) => "field",
            Self::Method(_) => "method",
            Self::Property(_) => "property",
            Self::Event(_) => "event",
        }
    }

    pub fn type_key(&self) -> &TypeKey {
        match self {
            Self::Type(k) => k,
            Self::Field(k) => &k.type_key,
            Self::Method(k) => &k.type_key,
            Self::Property(k) => &k.type_key,
            Self::Event(k) => &k.type_key,
        }
    }

    /// Member name, empty for types.
    pub fn member_name(&self) -> &str {
        match self {
            Self::Type(_) => "",
            Self::Field(k) => &k.name,
            Self::Method(k) => &k.name,
            Self::Property(k) => &k.name,
            Self::Event(k) => &k.name,
        }
    }

    pub fn fullname(&self) -> String {
        match self {
            Self::Type(k) => k.fullname(),
            Self::Field(k) => k.fullname(),
            Self::Method(k) => k.fullname(),
            Self::Property(k) => k.fullname(),
            Self::Event(k) => k.fullname(),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Type(_) => 0,
            Self::Field(_) => 1,
            Self::Method(_) => 2,
            Self::Property(_) => 3,
            Self::Event(_) => 4,
        }
    }
}

fn transition_allowed(old: &ObfuscationStatus, new: &ObfuscationStatus) -> bool {
    use ObfuscationStatus::*;
    match (old, new) {
        (_, Skipped(_)) => true,
        (Unknown, _) => true,
        (WillRename(_), WillRename(_)) => true,
        (WillRename(_), Renamed(_)) => true,
        (Renamed(a), Renamed(b)) => a == b,
        _ => false,
    }
}

/// Mapping from symbol key to status, keyed by pre-rename identities.
#[derive(Debug, Clone, Default)]
pub struct ObfuscationMap {
    entries: IndexMap<SymbolKey, ObfuscationStatus>,
    resources: Vec<(String, ObfuscationStatus)>,
}

impl ObfuscationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of a symbol; unseen keys read as `Unknown`.
    pub fn status(&self, key: &SymbolKey) -> ObfuscationStatus {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Records a status change, enforcing the transition invariant.
    pub fn update(&mut self, key: SymbolKey, status: ObfuscationStatus) {
        let old = self.entries.entry(key.clone()).or_default();
        assert!(
            transition_allowed(old, &status),
            "invalid status transition for {}: {:?} -> {:?}",
            key.fullname(),
            old,
            status
        );
        *old = status;
    }

    pub fn update_type(&mut self, key: TypeKey, status: ObfuscationStatus) {
        self.update(SymbolKey::Type(key), status);
    }

    pub fn update_field(&mut self, key: FieldKey, status: ObfuscationStatus) {
        self.update(SymbolKey::Field(key), status);
    }

    pub fn update_method(&mut self, key: MethodKey, status: ObfuscationStatus) {
        self.update(SymbolKey::Method(key), status);
    }

    pub fn update_property(&mut self, key: PropertyKey, status: ObfuscationStatus) {
        self.update(SymbolKey::Property(key), status);
    }

    pub fn update_event(&mut self, key: EventKey, status: ObfuscationStatus) {
        self.update(SymbolKey::Event(key), status);
    }

    pub fn method_status(&self, key: &MethodKey) -> ObfuscationStatus {
        self.status(&SymbolKey::Method(key.clone()))
    }

    pub fn add_resource(&mut self, name: impl Into<String>, status: ObfuscationStatus) {
        self.resources.push((name.into(), status));
    }

    pub fn resources(&self) -> &[(String, ObfuscationStatus)] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion (decision) order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolKey, &ObfuscationStatus)> {
        self.entries.iter()
    }

    /// Entries in report order: original namespace, then type, then member.
    pub fn iter_ordered(&self) -> Vec<(&SymbolKey, &ObfuscationStatus)> {
        let mut out: Vec<_> = self.entries.iter().collect();
        out.sort_by(|(a, _), (b, _)| {
            let ka = (
                &a.type_key().namespace,
                &a.type_key().name,
                a.kind_rank(),
                a.member_name(),
            );
            let kb = (
                &b.type_key().namespace,
                &b.type_key().name,
                b.kind_rank(),
                b.member_name(),
            );
            ka.cmp(&kb)
        });
        out
    }
}
