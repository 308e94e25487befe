//! Typed runtime values.
//!
//! A `FieldValue` is what the coercer produces and what an instance slot
//! holds: already shaped, so the setter can check conformance structurally
//! without re-parsing anything.

use serde_json::Value;

use crate::instance::Instance;
use crate::spec::TypeSpec;

/// A flat, ordered, string-keyed record as handed over by an external parser.
/// Read-only input to this crate; never mutated.
pub type RawRecord = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<FieldValue>),
    Object(Instance),
}

impl FieldValue {
    /// Strict structural conformance against a declared shape.
    ///
    /// This is the setter's last line of defense: no string parsing, no
    /// numeric widening — the value either already has the declared shape or
    /// it does not.
    pub fn conforms_to(&self, spec: &TypeSpec) -> bool {
        match (self, spec) {
            (FieldValue::Null, s) => s.is_nullable(),
            (v, TypeSpec::Nullable(inner)) => v.conforms_to(inner),
            (v, TypeSpec::Union(arms)) => arms.iter().any(|arm| v.conforms_to(arm)),
            (FieldValue::Bool(_), TypeSpec::Bool) => true,
            (FieldValue::Int(_), TypeSpec::Int) => true,
            (FieldValue::Float(_), TypeSpec::Float) => true,
            (FieldValue::Str(_), TypeSpec::String) => true,
            (FieldValue::Array(items), TypeSpec::ArrayOf(item)) => {
                items.iter().all(|v| v.conforms_to(item))
            }
            (FieldValue::Object(inst), TypeSpec::ObjectOf(id)) => inst.type_id() == id,
            _ => false,
        }
    }

    /// Strict conversion from a raw JSON value, used for schema-declared
    /// defaults. No coercion: a default must already have its declared shape.
    /// Composite defaults are not supported (`None`).
    pub fn from_raw_strict(raw: &Value, spec: &TypeSpec) -> Option<FieldValue> {
        match (raw, spec.unwrap_nullable()) {
            (Value::Null, _) if spec.is_nullable() => Some(FieldValue::Null),
            (v, TypeSpec::Union(arms)) => {
                arms.iter().find_map(|arm| FieldValue::from_raw_strict(v, arm))
            }
            (Value::Bool(b), TypeSpec::Bool) => Some(FieldValue::Bool(*b)),
            (Value::Number(n), TypeSpec::Int) => n.as_i64().map(FieldValue::Int),
            (Value::Number(n), TypeSpec::Float) => n.as_f64().map(FieldValue::Float),
            (Value::String(s), TypeSpec::String) => Some(FieldValue::Str(s.clone())),
            (Value::Array(items), TypeSpec::ArrayOf(item)) => items
                .iter()
                .map(|v| FieldValue::from_raw_strict(v, item))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::Array),
            _ => None,
        }
    }

    /// Coarse kind tag, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }

    /// Render back to JSON, for reports and CLI output.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            FieldValue::Object(inst) => inst.to_json(),
        }
    }
}

/// Coarse kind tag of a raw JSON value, for error messages.
pub fn raw_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ------------------------------- Tests ------------------------------------ //
