//! Typed schema files: the serialized form of a set of `TypeSchema`s.
//!
//! This is the registration surface for callers that keep their target types
//! in configuration rather than code (the CLI does). Parsing goes through
//! `serde_path_to_error` so a mistake in a deeply nested spec reports the
//! exact JSON path.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{PropertySchema, Registry, RegistryError, TypeSchema};
use crate::spec::TypeSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Type id → definition; file order is registration order.
    pub types: IndexMap<String, TypeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    pub properties: Vec<PropertyDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub spec: TypeSpec,
    /// `"default": null` is a real null default; leaving the key out means
    /// the property has no default. `Option` cannot express that split, so
    /// this uses its own presence-aware wrapper.
    #[serde(default, skip_serializing_if = "DefaultValue::is_absent")]
    pub default: DefaultValue,
    #[serde(default)]
    pub constructor_arg: bool,
    #[serde(default = "default_true")]
    pub writable: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DefaultValue {
    #[default]
    Absent,
    Provided(Value),
}

impl DefaultValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, DefaultValue::Absent)
    }

    fn into_option(self) -> Option<Value> {
        match self {
            DefaultValue::Absent => None,
            DefaultValue::Provided(v) => Some(v),
        }
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Absent is skipped at the field level; this arm is unreachable
            // through `SchemaFile` serialization
            DefaultValue::Absent => serializer.serialize_none(),
            DefaultValue::Provided(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // only called when the key is present, so even a JSON null is a
        // provided default
        Ok(DefaultValue::Provided(Value::deserialize(deserializer)?))
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

impl SchemaFile {
    pub fn parse(src: &str) -> Result<SchemaFile, String> {
        from_str_with_path(src)
    }

    /// Register every declared type, in file order.
    pub fn register_into(self, registry: &Registry) -> Result<(), RegistryError> {
        for (id, def) in self.types {
            let properties = def
                .properties
                .into_iter()
                .map(|p| PropertySchema {
                    name: p.name,
                    spec: p.spec,
                    default: p.default.into_option(),
                    constructor_arg: p.constructor_arg,
                    writable: p.writable,
                })
                .collect();
            registry.register(TypeSchema { id, properties })?;
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //
