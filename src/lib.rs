//! Partial-tolerant object denormalizer.
//!
//! Populates the typed fields of a target instance from an untyped, flat
//! string-keyed record where some values may not fit their declared types.
//! Every field whose value converts is set; every field whose value does not
//! is left at its default and reported by name, so a caller can tell a fully
//! populated object from one with diagnosed holes:
//!
//! - `Success(object)` — everything converted;
//! - `PartialFailure(object, errors)` — object exists, the listed properties
//!   are at their defaults;
//! - `HardFailure(error)` — the object could not be built at all.
//!
//! Input parsing (bytes → record), name-convention translation, and the glue
//! driving a record stream live outside this crate; target types are
//! registered as explicit schemas (see [`registry`] and [`schema_file`]).

pub mod cli;
pub mod coerce;
pub mod denormalize;
pub mod instance;
pub mod names;
pub mod registry;
pub mod schema_file;
pub mod spec;
pub mod value;

pub use coerce::CoercionFailureKind;
pub use denormalize::{
    denormalize, DenormalizationContext, DenormalizationResult, DenormalizeError, PropertyError,
};
pub use instance::Instance;
pub use names::{IdentityNames, NameResolver, SnakeCaseNames};
pub use registry::{PropertyDescriptor, Registry, RegistryError, TypeSchema};
pub use schema_file::SchemaFile;
pub use spec::{TypeId, TypeSpec};
pub use value::{FieldValue, RawRecord};
