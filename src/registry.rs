//! Type descriptor registry.
//!
//! Rust has no runtime class reflection, so composite types are registered
//! explicitly as `TypeSchema`s (the schema-registration route). `describe`
//! derives the ordered property descriptor list from a registered schema,
//! at most once per type, and hands out shared slices so concurrent callers
//! read without copying.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;

use crate::spec::{TypeId, TypeSpec};
use crate::value::FieldValue;

// ------------------------------ Schemas ----------------------------------- //

/// Declaration of one property, as registered.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: String,
    pub spec: TypeSpec,
    /// Declared default as raw JSON. `Some(Value::Null)` is a real null
    /// default; `None` means the property has no default at all.
    pub default: Option<Value>,
    /// Supplied through the constructor: absence of a required value makes
    /// the whole object unbuildable rather than partially populated.
    pub constructor_arg: bool,
    pub writable: bool,
}

/// Declaration of one composite target type.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    pub id: TypeId,
    pub properties: Vec<PropertySchema>,
}

impl TypeSchema {
    pub fn new(id: impl Into<TypeId>) -> Self {
        TypeSchema { id: id.into(), properties: Vec::new() }
    }

    /// Plain writable property, no default.
    pub fn field(mut self, name: &str, spec: TypeSpec) -> Self {
        self.properties.push(PropertySchema {
            name: name.to_string(),
            spec,
            default: None,
            constructor_arg: false,
            writable: true,
        });
        self
    }

    /// Writable property with a declared default.
    pub fn defaulted(mut self, name: &str, spec: TypeSpec, default: Value) -> Self {
        self.properties.push(PropertySchema {
            name: name.to_string(),
            spec,
            default: Some(default),
            constructor_arg: false,
            writable: true,
        });
        self
    }

    /// Constructor-supplied property, optionally defaulted.
    pub fn constructor(mut self, name: &str, spec: TypeSpec, default: Option<Value>) -> Self {
        self.properties.push(PropertySchema {
            name: name.to_string(),
            spec,
            default,
            constructor_arg: true,
            writable: true,
        });
        self
    }

    /// Getter-only property: present input values are reported, not applied.
    pub fn read_only(mut self, name: &str, spec: TypeSpec) -> Self {
        self.properties.push(PropertySchema {
            name: name.to_string(),
            spec,
            default: None,
            constructor_arg: false,
            writable: false,
        });
        self
    }
}

// ---------------------------- Descriptors --------------------------------- //

/// Static metadata for one property, derived once per registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub spec: TypeSpec,
    pub nullable: bool,
    pub default: Option<FieldValue>,
    pub constructor_arg: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("target type `{0}` exposes no registered property list")]
    UnsupportedTargetType(TypeId),
    #[error("type `{0}` is already registered")]
    DuplicateType(TypeId),
    #[error("invalid default for `{type_id}.{property}`: value does not conform to `{spec}`")]
    InvalidDefault { type_id: TypeId, property: String, spec: TypeSpec },
}

// ------------------------------ Registry ---------------------------------- //

/// Read-mostly store of type schemas plus a memoized descriptor cache.
///
/// Many readers may call `describe` concurrently while records are being
/// denormalized in parallel; derivation runs at most once per type and the
/// resulting slice is shared.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: RwLock<HashMap<TypeId, TypeSchema>>,
    derived: RwLock<HashMap<TypeId, Arc<[PropertyDescriptor]>>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Process-wide registry for callers that share one schema set.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn register(&self, schema: TypeSchema) -> Result<(), RegistryError> {
        let mut schemas = self.schemas.write().expect("registry lock poisoned");
        if schemas.contains_key(&schema.id) {
            return Err(RegistryError::DuplicateType(schema.id));
        }
        schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.schemas.read().expect("registry lock poisoned").contains_key(id)
    }

    /// Ordered property descriptors for a target type.
    ///
    /// Deterministic: declaration order, memoized after the first call.
    pub fn describe(&self, id: &str) -> Result<Arc<[PropertyDescriptor]>, RegistryError> {
        if let Some(hit) = self.derived.read().expect("registry lock poisoned").get(id) {
            return Ok(Arc::clone(hit));
        }

        let derived: Arc<[PropertyDescriptor]> = {
            let schemas = self.schemas.read().expect("registry lock poisoned");
            let schema = schemas
                .get(id)
                .ok_or_else(|| RegistryError::UnsupportedTargetType(id.to_string()))?;
            derive_descriptors(schema)?.into()
        };

        let mut cache = self.derived.write().expect("registry lock poisoned");
        // another thread may have derived meanwhile; keep the first entry
        Ok(Arc::clone(cache.entry(id.to_string()).or_insert(derived)))
    }
}

fn derive_descriptors(schema: &TypeSchema) -> Result<Vec<PropertyDescriptor>, RegistryError> {
    schema
        .properties
        .iter()
        .map(|p| {
            let default = match &p.default {
                None => None,
                Some(raw) => Some(FieldValue::from_raw_strict(raw, &p.spec).ok_or_else(|| {
                    RegistryError::InvalidDefault {
                        type_id: schema.id.clone(),
                        property: p.name.clone(),
                        spec: p.spec.clone(),
                    }
                })?),
            };
            Ok(PropertyDescriptor {
                name: p.name.clone(),
                spec: p.spec.clone(),
                nullable: p.spec.is_nullable(),
                default,
                constructor_arg: p.constructor_arg,
                writable: p.writable,
            })
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nullable(spec: TypeSpec) -> TypeSpec {
        TypeSpec::Nullable(Box::new(spec))
    }

    #[test]
    fn describe_preserves_declaration_order() {
        let registry = Registry::new();
        registry
            .register(
                TypeSchema::new("Widget")
                    .field("beta", TypeSpec::Int)
                    .field("alpha", TypeSpec::Bool)
                    .field("gamma", TypeSpec::String),
            )
            .unwrap();
        let props = registry.describe("Widget").unwrap();
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["beta", "alpha", "gamma"]);
    }

    #[test]
    fn describe_is_memoized() {
        let registry = Registry::new();
        registry
            .register(TypeSchema::new("T").field("x", TypeSpec::Int))
            .unwrap();
        let a = registry.describe("T").unwrap();
        let b = registry.describe("T").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let registry = Registry::new();
        assert_eq!(
            registry.describe("Ghost"),
            Err(RegistryError::UnsupportedTargetType("Ghost".into()))
        );
    }

    #[test]
    fn nullability_and_defaults_are_derived() {
        let registry = Registry::new();
        registry
            .register(
                TypeSchema::new("T")
                    .defaulted("plop", nullable(TypeSpec::Bool), json!(null))
                    .field("count", TypeSpec::Int),
            )
            .unwrap();
        let props = registry.describe("T").unwrap();
        assert!(props[0].nullable);
        assert_eq!(props[0].default, Some(FieldValue::Null));
        assert!(!props[1].nullable);
        assert_eq!(props[1].default, None);
    }

    #[test]
    fn non_conforming_default_is_rejected() {
        let registry = Registry::new();
        registry
            .register(TypeSchema::new("T").defaulted("count", TypeSpec::Int, json!("zero")))
            .unwrap();
        assert!(matches!(
            registry.describe("T"),
            Err(RegistryError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn global_registry_is_process_wide() {
        Registry::global()
            .register(TypeSchema::new("GlobalWidget").field("x", TypeSpec::Int))
            .unwrap();
        assert!(Registry::global().is_registered("GlobalWidget"));
        assert_eq!(Registry::global().describe("GlobalWidget").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let registry = Registry::new();
        registry.register(TypeSchema::new("T")).unwrap();
        assert_eq!(
            registry.register(TypeSchema::new("T")),
            Err(RegistryError::DuplicateType("T".into()))
        );
    }
}
