// Declared type shapes. No serde_json::Value here.

use serde::{Deserialize, Serialize};

/// Identifier of a registered composite type.
pub type TypeId = String;

/// The shape a raw value must conform to before it may be assigned.
///
/// Serialized form is the externally-tagged one, so schema files read
/// naturally: scalars are plain strings (`"bool"`, `"int"`), compounds are
/// one-key objects (`{"array": "int"}`, `{"nullable": {"object": "Address"}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSpec {
    Bool,
    Int,
    Float,
    String,
    #[serde(rename = "array")]
    ArrayOf(Box<TypeSpec>),
    /// Reference to a composite type registered under this id.
    #[serde(rename = "object")]
    ObjectOf(TypeId),
    /// X ∪ null. An explicit raw null is acceptable here and nowhere else.
    Nullable(Box<TypeSpec>),
    /// Arms are tried in declared order.
    Union(Vec<TypeSpec>),
}

impl TypeSpec {
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeSpec::Nullable(_) => true,
            TypeSpec::Union(arms) => arms.iter().any(TypeSpec::is_nullable),
            _ => false,
        }
    }

    /// Strip `Nullable` wrappers down to the underlying shape.
    pub fn unwrap_nullable(&self) -> &TypeSpec {
        match self {
            TypeSpec::Nullable(inner) => inner.unwrap_nullable(),
            other => other,
        }
    }
}

impl std::fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::Int => write!(f, "int"),
            TypeSpec::Float => write!(f, "float"),
            TypeSpec::String => write!(f, "string"),
            TypeSpec::ArrayOf(item) => write!(f, "array<{item}>"),
            TypeSpec::ObjectOf(id) => write!(f, "object<{id}>"),
            TypeSpec::Nullable(inner) => write!(f, "{inner}?"),
            TypeSpec::Union(arms) => {
                write!(f, "(")?;
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{arm}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_serialize_as_plain_strings() {
        assert_eq!(serde_json::to_value(&TypeSpec::Bool).unwrap(), serde_json::json!("bool"));
        let back: TypeSpec = serde_json::from_value(serde_json::json!("float")).unwrap();
        assert_eq!(back, TypeSpec::Float);
    }

    #[test]
    fn compounds_round_trip() {
        let spec = TypeSpec::Nullable(Box::new(TypeSpec::ArrayOf(Box::new(TypeSpec::Int))));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({"nullable": {"array": "int"}}));
        let back: TypeSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn nullable_detection_sees_through_unions() {
        let spec = TypeSpec::Union(vec![
            TypeSpec::Int,
            TypeSpec::Nullable(Box::new(TypeSpec::String)),
        ]);
        assert!(spec.is_nullable());
        assert!(!TypeSpec::Int.is_nullable());
    }

    #[test]
    fn display_is_compact() {
        let spec = TypeSpec::ArrayOf(Box::new(TypeSpec::Nullable(Box::new(TypeSpec::Bool))));
        assert_eq!(spec.to_string(), "array<bool?>");
        let spec = TypeSpec::Union(vec![TypeSpec::Int, TypeSpec::ObjectOf("Address".into())]);
        assert_eq!(spec.to_string(), "(int | object<Address>)");
    }
}
