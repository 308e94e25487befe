//! The denormalization orchestrator.
//!
//! Drives the per-property loop: registry order, name resolution, raw
//! lookup, coercion, assignment. Failures are captured as data and either
//! accumulated (`collect_errors`) or turned into an immediate hard failure;
//! nothing unwinds past this boundary.

use serde_json::Value;
use thiserror::Error;

use crate::coerce::{coerce, CoerceFail, CoercionFailureKind};
use crate::instance::Instance;
use crate::names::{IdentityNames, NameResolver};
use crate::registry::{Registry, RegistryError};
use crate::spec::TypeSpec;
use crate::value::RawRecord;

// ------------------------------ Context ----------------------------------- //

/// Configuration for one denormalization call. Immutable for its duration.
#[derive(Clone, Copy)]
pub struct DenormalizationContext<'a> {
    /// Keep going past a failed property and report every failure, instead
    /// of aborting on the first one.
    pub collect_errors: bool,
    /// Relax string-vs-scalar coercion checks. Assignment still re-checks,
    /// so relaxed values surface as `TypeMismatch` at the setter.
    pub disable_type_enforcement: bool,
    pub resolver: &'a dyn NameResolver,
}

static IDENTITY: IdentityNames = IdentityNames;

impl DenormalizationContext<'static> {
    pub fn new() -> Self {
        DenormalizationContext {
            collect_errors: false,
            disable_type_enforcement: false,
            resolver: &IDENTITY,
        }
    }
}

impl Default for DenormalizationContext<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DenormalizationContext<'a> {
    pub fn collecting_errors(mut self) -> Self {
        self.collect_errors = true;
        self
    }

    pub fn without_type_enforcement(mut self) -> Self {
        self.disable_type_enforcement = true;
        self
    }

    pub fn with_resolver<'b>(self, resolver: &'b dyn NameResolver) -> DenormalizationContext<'b> {
        DenormalizationContext {
            collect_errors: self.collect_errors,
            disable_type_enforcement: self.disable_type_enforcement,
            resolver,
        }
    }
}

// ------------------------------ Errors ------------------------------------ //

/// One failed property: which one, what the input held, what was declared,
/// and why it failed. Never silently dropped.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("`{property}`: {cause} (raw value {attempted}, target `{target}`)")]
pub struct PropertyError {
    pub property: String,
    pub attempted: Value,
    pub target: TypeSpec,
    pub cause: CoercionFailureKind,
}

impl PropertyError {
    /// Re-root a nested error under its parent property (`parent.child`).
    pub(crate) fn prefixed(mut self, parent: &str) -> PropertyError {
        self.property = format!("{parent}.{}", self.property);
        self
    }
}

/// Why no usable object came out of a call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DenormalizeError {
    /// The target type itself is unusable; never mixed into per-property
    /// error lists.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// First failure under abort-on-error, or an unsatisfiable constructor
    /// precondition.
    #[error(transparent)]
    Property(PropertyError),
    /// Every failed property of a partially-populated object a strict caller
    /// chose to discard.
    #[error("failed to populate {} properties", .0.len())]
    Partial(Vec<PropertyError>),
}

// ------------------------------ Result ------------------------------------ //

/// Outcome of one denormalization call.
///
/// `PartialFailure` still carries the object: every successfully coerced
/// field is set, every failed field is at its default. Callers that want no
/// partial objects should go through [`DenormalizationResult::into_strict`].
#[must_use]
#[derive(Debug, PartialEq)]
pub enum DenormalizationResult {
    Success(Instance),
    PartialFailure(Instance, Vec<PropertyError>),
    HardFailure(DenormalizeError),
}

impl DenormalizationResult {
    pub fn object(&self) -> Option<&Instance> {
        match self {
            DenormalizationResult::Success(inst)
            | DenormalizationResult::PartialFailure(inst, _) => Some(inst),
            DenormalizationResult::HardFailure(_) => None,
        }
    }

    pub fn errors(&self) -> &[PropertyError] {
        match self {
            DenormalizationResult::PartialFailure(_, errors) => errors,
            _ => &[],
        }
    }

    /// Treat partial population as total failure and discard the object.
    pub fn into_strict(self) -> Result<Instance, DenormalizeError> {
        match self {
            DenormalizationResult::Success(inst) => Ok(inst),
            DenormalizationResult::PartialFailure(_, errors) => {
                Err(DenormalizeError::Partial(errors))
            }
            DenormalizationResult::HardFailure(e) => Err(e),
        }
    }
}

// ---------------------------- Orchestrator -------------------------------- //

/// Denormalize one record into an instance of the registered type.
///
/// Pure and synchronous: the only side effect is the instance being built.
/// Properties are processed in the registry's declared order and the error
/// list preserves that order.
pub fn denormalize(
    registry: &Registry,
    type_id: &str,
    record: &RawRecord,
    ctx: &DenormalizationContext<'_>,
) -> DenormalizationResult {
    let props = match registry.describe(type_id) {
        Ok(props) => props,
        Err(e) => return DenormalizationResult::HardFailure(e.into()),
    };

    // Constructor precondition: every required, non-defaulted argument must
    // have a raw value, or the object cannot exist at all.
    for p in props.iter() {
        if p.constructor_arg && p.default.is_none() && !p.nullable {
            let key = ctx.resolver.resolve(&p.name);
            if !record.contains_key(&key) {
                return DenormalizationResult::HardFailure(DenormalizeError::Property(
                    PropertyError {
                        property: p.name.clone(),
                        attempted: Value::Null,
                        target: p.spec.clone(),
                        cause: CoercionFailureKind::MissingRequiredValue,
                    },
                ));
            }
        }
    }

    let mut instance = Instance::allocate(type_id, &props);
    let mut errors: Vec<PropertyError> = Vec::new();

    for p in props.iter() {
        let key = ctx.resolver.resolve(&p.name);
        let Some(raw) = record.get(&key) else {
            if p.default.is_some() || p.nullable {
                // default stands / absence counts as an explicit null
                continue;
            }
            let err = PropertyError {
                property: p.name.clone(),
                attempted: Value::Null,
                target: p.spec.clone(),
                cause: CoercionFailureKind::MissingRequiredValue,
            };
            if ctx.collect_errors {
                errors.push(err);
                continue;
            }
            return DenormalizationResult::HardFailure(DenormalizeError::Property(err));
        };

        let coerced = match coerce(raw, &p.spec, &p.name, registry, ctx) {
            Ok(c) => c,
            Err(CoerceFail::Fatal(e)) => return DenormalizationResult::HardFailure(e),
            Err(CoerceFail::Collectible(err)) => {
                if ctx.collect_errors {
                    errors.push(err);
                    continue;
                }
                return DenormalizationResult::HardFailure(DenormalizeError::Property(err));
            }
        };

        if let Err(cause) = instance.set_field(&p.name, coerced.value) {
            let err = PropertyError {
                property: p.name.clone(),
                attempted: raw.clone(),
                target: p.spec.clone(),
                cause,
            };
            if ctx.collect_errors {
                errors.push(err);
                continue;
            }
            return DenormalizationResult::HardFailure(DenormalizeError::Property(err));
        }
        errors.extend(coerced.nested_errors);
    }

    if errors.is_empty() {
        DenormalizationResult::Success(instance)
    } else {
        DenormalizationResult::PartialFailure(instance, errors)
    }
}

// ------------------------------- Tests ------------------------------------ //
