//! Structural, rename-independent symbol identities.
//!
//! A key computed from a definition and a key computed from any reference to
//! that definition compare equal whenever they denote the same symbol, so
//! keys are plain value structs compared field by field, never by object
//! identity. Nested types are identified by their `/`-joined declaring-chain
//! path, which keeps keys unique without a namespace of their own.

use crate::model::{EventDef, FieldDef, MethodDef, PropertyDef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a type: declaring module scope, namespace, and name path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    pub scope: String,
    pub namespace: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Namespace-qualified name, without the module scope.
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.scope, self.fullname())
    }
}

/// Parameter-type signature of a method, frozen at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamSig {
    pub params: Vec<String>,
}

impl ParamSig {
    pub fn new(params: Vec<String>) -> Self {
        Self { params }
    }

    pub fn of(method: &MethodDef) -> Self {
        Self {
            params: method.params.iter().map(|p| p.param_type.clone()).collect(),
        }
    }
}

impl fmt::Display for ParamSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.join(","))
    }
}

/// Identity of a field: declaring type, field-type signature, and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub type_key: TypeKey,
    pub signature: String,
    pub name: String,
}

impl FieldKey {
    pub fn new(type_key: TypeKey, signature: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_key,
            signature: signature.into(),
            name: name.into(),
        }
    }

    pub fn of(type_key: TypeKey, field: &FieldDef) -> Self {
        Self::new(type_key, field.signature.clone(), field.name.clone())
    }

    pub fn fullname(&self) -> String {
        format!("{}::{}", self.type_key.fullname(), self.name)
    }
}

/// Identity of a method: declaring type, name, and parameter signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub type_key: TypeKey,
    pub name: String,
    pub sig: ParamSig,
}

impl MethodKey {
    pub fn new(type_key: TypeKey, name: impl Into<String>, sig: ParamSig) -> Self {
        Self {
            type_key,
            name: name.into(),
            sig,
        }
    }

    pub fn of(type_key: TypeKey, method: &MethodDef) -> Self {
        Self::new(type_key, method.name.clone(), ParamSig::of(method))
    }

    pub fn fullname(&self) -> String {
        format!("{}::{}{}", self.type_key.fullname(), self.name, self.sig)
    }
}

/// Identity of a property: declaring type, property type, and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyKey {
    pub type_key: TypeKey,
    pub prop_type: String,
    pub name: String,
}

impl PropertyKey {
    pub fn of(type_key: TypeKey, prop: &PropertyDef) -> Self {
        Self {
            type_key,
            prop_type: prop.prop_type.clone(),
            name: prop.name.clone(),
        }
    }

    pub fn fullname(&self) -> String {
        format!("{}::{}", self.type_key.fullname(), self.name)
    }
}

/// Identity of an event: declaring type, handler type, and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub type_key: TypeKey,
    pub event_type: String,
    pub name: String,
}

impl EventKey {
    pub fn of(type_key: TypeKey, evt: &EventDef) -> Self {
        Self {
            type_key,
            event_type: evt.event_type.clone(),
            name: evt.name.clone(),
        }
    }

    pub fn fullname(&self) -> String {
        format!("{}::{}", self.type_key.fullname(), self.name)
    }
}
