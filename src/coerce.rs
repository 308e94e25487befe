//! The value coercer: raw JSON value → typed `FieldValue`, or a typed
//! failure.
//!
//! Failed coercions are routine outcomes here, not programming errors, so
//! everything flows through `Result` values; nothing unwinds past this
//! module.
//!
//! Coercion policy (the tolerant-vs-strict boundary):
//! - null is accepted only where the declared shape is nullable;
//! - strings become booleans only via the `1/0`, `true/false`, `yes/no`
//!   token set (case-insensitive);
//! - numeric strings must be exact literals, whitespace included — nothing
//!   is trimmed;
//! - arrays coerce per element and fail whole with the first element's
//!   reason attached;
//! - composite targets recurse into the full denormalization contract;
//! - `disable_type_enforcement` relaxes string-vs-scalar checks only, and
//!   assignment still re-checks (strictness is preserved at the setter).

use serde_json::Value;
use thiserror::Error;

use crate::denormalize::{denormalize, DenormalizationContext, DenormalizationResult, DenormalizeError, PropertyError};
use crate::registry::Registry;
use crate::spec::TypeSpec;
use crate::value::{raw_kind, FieldValue};

/// Why one property could not be populated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionFailureKind {
    #[error("null is not allowed for this property")]
    NullNotAllowed,
    #[error("value cannot be interpreted as a boolean")]
    NotABool,
    #[error("value is not a valid numeric literal")]
    NotANumber,
    #[error("element {index} failed: {cause}")]
    ArrayElementFailed {
        index: usize,
        cause: Box<CoercionFailureKind>,
    },
    #[error("expected `{expected}`, got {actual}")]
    TypeMismatch {
        expected: TypeSpec,
        actual: &'static str,
    },
    #[error("no such property on the target type")]
    UnknownProperty,
    #[error("property is not writable")]
    NotWritable,
    #[error("required value missing from input")]
    MissingRequiredValue,
}

/// A successfully shaped value, plus any errors a nested composite collected
/// on the way (dotted paths, parent side keeps them in declared order).
#[derive(Debug)]
pub(crate) struct Coerced {
    pub value: FieldValue,
    pub nested_errors: Vec<PropertyError>,
}

impl Coerced {
    fn plain(value: FieldValue) -> Coerced {
        Coerced { value, nested_errors: Vec::new() }
    }
}

/// Collectible failures become one `PropertyError`; fatal ones (the target
/// type itself is unusable) abort the whole denormalization.
#[derive(Debug)]
pub(crate) enum CoerceFail {
    Collectible(PropertyError),
    Fatal(DenormalizeError),
}

pub(crate) fn coerce(
    raw: &Value,
    spec: &TypeSpec,
    path: &str,
    registry: &Registry,
    ctx: &DenormalizationContext<'_>,
) -> Result<Coerced, CoerceFail> {
    let fail = |cause: CoercionFailureKind| {
        CoerceFail::Collectible(PropertyError {
            property: path.to_string(),
            attempted: raw.clone(),
            target: spec.clone(),
            cause,
        })
    };

    if raw.is_null() {
        return if spec.is_nullable() {
            Ok(Coerced::plain(FieldValue::Null))
        } else {
            Err(fail(CoercionFailureKind::NullNotAllowed))
        };
    }

    let mismatch = || {
        fail(CoercionFailureKind::TypeMismatch {
            expected: spec.clone(),
            actual: raw_kind(raw),
        })
    };

    match spec.unwrap_nullable() {
        TypeSpec::Bool => match raw {
            Value::Bool(b) => Ok(Coerced::plain(FieldValue::Bool(*b))),
            Value::String(s) => match parse_bool_token(s) {
                Some(b) => Ok(Coerced::plain(FieldValue::Bool(b))),
                None if ctx.disable_type_enforcement => {
                    Ok(Coerced::plain(FieldValue::Str(s.clone())))
                }
                None => Err(fail(CoercionFailureKind::NotABool)),
            },
            Value::Number(_) => Err(fail(CoercionFailureKind::NotABool)),
            _ => Err(mismatch()),
        },

        TypeSpec::Int => match raw {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Coerced::plain(FieldValue::Int(i))),
                // float raws do not silently truncate
                None => Err(fail(CoercionFailureKind::NotANumber)),
            },
            Value::String(s) => match s.parse::<i64>() {
                Ok(i) => Ok(Coerced::plain(FieldValue::Int(i))),
                Err(_) if ctx.disable_type_enforcement => {
                    Ok(Coerced::plain(FieldValue::Str(s.clone())))
                }
                Err(_) => Err(fail(CoercionFailureKind::NotANumber)),
            },
            Value::Bool(_) => Err(fail(CoercionFailureKind::NotANumber)),
            _ => Err(mismatch()),
        },

        TypeSpec::Float => match raw {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(Coerced::plain(FieldValue::Float(f))),
                None => Err(fail(CoercionFailureKind::NotANumber)),
            },
            Value::String(s) => match parse_float_literal(s) {
                Some(f) => Ok(Coerced::plain(FieldValue::Float(f))),
                None if ctx.disable_type_enforcement => {
                    Ok(Coerced::plain(FieldValue::Str(s.clone())))
                }
                None => Err(fail(CoercionFailureKind::NotANumber)),
            },
            Value::Bool(_) => Err(fail(CoercionFailureKind::NotANumber)),
            _ => Err(mismatch()),
        },

        TypeSpec::String => match raw {
            Value::String(s) => Ok(Coerced::plain(FieldValue::Str(s.clone()))),
            _ => Err(mismatch()),
        },

        TypeSpec::ArrayOf(item) => match raw {
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                let mut nested_errors = Vec::new();
                for (index, elem) in items.iter().enumerate() {
                    let elem_path = format!("{path}.{index}");
                    match coerce(elem, item, &elem_path, registry, ctx) {
                        Ok(c) => {
                            values.push(c.value);
                            nested_errors.extend(c.nested_errors);
                        }
                        Err(CoerceFail::Fatal(e)) => return Err(CoerceFail::Fatal(e)),
                        Err(CoerceFail::Collectible(e)) => {
                            // whole array fails with the first element's reason
                            return Err(fail(CoercionFailureKind::ArrayElementFailed {
                                index,
                                cause: Box::new(e.cause),
                            }));
                        }
                    }
                }
                Ok(Coerced { value: FieldValue::Array(values), nested_errors })
            }
            _ => Err(mismatch()),
        },

        TypeSpec::ObjectOf(id) => match raw {
            Value::Object(map) => match denormalize(registry, id, map, ctx) {
                DenormalizationResult::Success(inst) => {
                    Ok(Coerced::plain(FieldValue::Object(inst)))
                }
                DenormalizationResult::PartialFailure(inst, errors) => Ok(Coerced {
                    value: FieldValue::Object(inst),
                    nested_errors: errors.into_iter().map(|e| e.prefixed(path)).collect(),
                }),
                DenormalizationResult::HardFailure(DenormalizeError::Property(e)) => {
                    Err(CoerceFail::Collectible(e.prefixed(path)))
                }
                DenormalizationResult::HardFailure(e) => Err(CoerceFail::Fatal(e)),
            },
            _ => Err(mismatch()),
        },

        TypeSpec::Union(arms) => {
            let mut first_err = None;
            for arm in arms {
                match coerce(raw, arm, path, registry, ctx) {
                    Ok(c) => return Ok(c),
                    Err(CoerceFail::Fatal(e)) => return Err(CoerceFail::Fatal(e)),
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
            // no arm matched: report the first arm's failure, deterministically
            Err(first_err.unwrap_or_else(mismatch))
        }

        // unwrap_nullable never returns a Nullable wrapper
        TypeSpec::Nullable(_) => unreachable!(),
    }
}

fn parse_bool_token(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Decimal literal check: digits, sign, point, exponent. Rejects padded
/// strings and the `inf`/`NaN` spellings `f64::from_str` would accept.
fn parse_float_literal(s: &str) -> Option<f64> {
    let literal_bytes = s
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'));
    if !literal_bytes {
        return None;
    }
    s.parse::<f64>().ok()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DenormalizationContext<'static> {
        DenormalizationContext::new()
    }

    fn coerce_plain(raw: Value, spec: TypeSpec) -> Result<FieldValue, CoercionFailureKind> {
        let registry = Registry::new();
        match coerce(&raw, &spec, "p", &registry, &ctx()) {
            Ok(c) => Ok(c.value),
            Err(CoerceFail::Collectible(e)) => Err(e.cause),
            Err(CoerceFail::Fatal(e)) => panic!("unexpected fatal failure: {e}"),
        }
    }

    #[test]
    fn bool_token_set_is_closed() {
        for (tok, want) in [("1", true), ("0", false), ("TRUE", true), ("no", false), ("Yes", true)] {
            assert_eq!(coerce_plain(Value::from(tok), TypeSpec::Bool), Ok(FieldValue::Bool(want)));
        }
        assert_eq!(
            coerce_plain(Value::from("fraise"), TypeSpec::Bool),
            Err(CoercionFailureKind::NotABool)
        );
        assert_eq!(
            coerce_plain(Value::from("on"), TypeSpec::Bool),
            Err(CoercionFailureKind::NotABool)
        );
    }

    #[test]
    fn numeric_strings_are_not_trimmed() {
        assert_eq!(coerce_plain(Value::from("42"), TypeSpec::Int), Ok(FieldValue::Int(42)));
        assert_eq!(
            coerce_plain(Value::from(" 42"), TypeSpec::Int),
            Err(CoercionFailureKind::NotANumber)
        );
        assert_eq!(
            coerce_plain(Value::from("4.5 "), TypeSpec::Float),
            Err(CoercionFailureKind::NotANumber)
        );
        assert_eq!(coerce_plain(Value::from("4.5e2"), TypeSpec::Float), Ok(FieldValue::Float(450.0)));
        assert_eq!(
            coerce_plain(Value::from("inf"), TypeSpec::Float),
            Err(CoercionFailureKind::NotANumber)
        );
    }

    #[test]
    fn int_raws_widen_to_float_but_not_the_reverse() {
        assert_eq!(coerce_plain(Value::from(4), TypeSpec::Float), Ok(FieldValue::Float(4.0)));
        assert_eq!(
            coerce_plain(Value::from(4.5), TypeSpec::Int),
            Err(CoercionFailureKind::NotANumber)
        );
    }

    #[test]
    fn null_only_where_nullable() {
        let nullable_int = TypeSpec::Nullable(Box::new(TypeSpec::Int));
        assert_eq!(coerce_plain(Value::Null, nullable_int), Ok(FieldValue::Null));
        assert_eq!(
            coerce_plain(Value::Null, TypeSpec::Int),
            Err(CoercionFailureKind::NullNotAllowed)
        );
    }

    #[test]
    fn array_fails_whole_with_first_element_reason() {
        let spec = TypeSpec::ArrayOf(Box::new(TypeSpec::Int));
        let raw = serde_json::json!(["1", "two", "three"]);
        let err = coerce_plain(raw, spec).unwrap_err();
        assert_eq!(
            err,
            CoercionFailureKind::ArrayElementFailed {
                index: 1,
                cause: Box::new(CoercionFailureKind::NotANumber),
            }
        );
    }

    #[test]
    fn string_against_object_is_a_type_mismatch() {
        let err = coerce_plain(Value::from("myrtille"), TypeSpec::ObjectOf("Obj".into())).unwrap_err();
        assert!(matches!(err, CoercionFailureKind::TypeMismatch { actual: "string", .. }));
    }

    #[test]
    fn relaxed_mode_passes_scalar_strings_through() {
        let registry = Registry::new();
        let relaxed = DenormalizationContext::new().without_type_enforcement();
        let c = coerce(&Value::from("fraise"), &TypeSpec::Bool, "p", &registry, &relaxed).unwrap();
        assert_eq!(c.value, FieldValue::Str("fraise".into()));
        // shape checks are not relaxed
        let err = coerce(
            &Value::from("x"),
            &TypeSpec::ArrayOf(Box::new(TypeSpec::Int)),
            "p",
            &registry,
            &relaxed,
        );
        assert!(matches!(err, Err(CoerceFail::Collectible(_))));
    }

    #[test]
    fn union_reports_first_arm_failure() {
        let spec = TypeSpec::Union(vec![TypeSpec::Int, TypeSpec::Bool]);
        assert_eq!(coerce_plain(Value::from("true"), spec.clone()), Ok(FieldValue::Bool(true)));
        assert_eq!(
            coerce_plain(Value::from("zzz"), spec),
            Err(CoercionFailureKind::NotANumber)
        );
    }
}
