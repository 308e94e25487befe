//! The target object under construction, and the attribute setter.
//!
//! An `Instance` is a slot table derived from a registered type: one slot per
//! property, pre-filled with the property's default (or null when unset).
//! `set_field` is the assignment layer of the pipeline and performs its own
//! strict conformance check, so a value that slipped past a relaxed coercion
//! still cannot land in a slot with the wrong shape.

use indexmap::IndexMap;
use serde_json::Value;

use crate::coerce::CoercionFailureKind;
use crate::registry::PropertyDescriptor;
use crate::spec::{TypeId, TypeSpec};
use crate::value::FieldValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_id: TypeId,
    slots: IndexMap<String, Slot>,
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    spec: TypeSpec,
    writable: bool,
    value: FieldValue,
}

impl Instance {
    /// Allocate a fresh instance with every slot at its default.
    ///
    /// Slots without a declared default start at null — the "unset" state a
    /// failed property is guaranteed to keep.
    pub(crate) fn allocate(type_id: &str, properties: &[PropertyDescriptor]) -> Instance {
        let slots = properties
            .iter()
            .map(|p| {
                let value = p.default.clone().unwrap_or(FieldValue::Null);
                (p.name.clone(), Slot { spec: p.spec.clone(), writable: p.writable, value })
            })
            .collect();
        Instance { type_id: type_id.to_string(), slots }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.slots.get(name).map(|s| &s.value)
    }

    /// Property names in declared order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Assign a coerced value to a property.
    ///
    /// Either the slot takes the value whole or it is left untouched; a slot
    /// never holds a value of the wrong declared shape.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoercionFailureKind> {
        let Some(slot) = self.slots.get_mut(name) else {
            return Err(CoercionFailureKind::UnknownProperty);
        };
        if !slot.writable {
            return Err(CoercionFailureKind::NotWritable);
        }
        if !value.conforms_to(&slot.spec) {
            return Err(CoercionFailureKind::TypeMismatch {
                expected: slot.spec.clone(),
                actual: value.kind(),
            });
        }
        slot.value = value;
        Ok(())
    }

    /// Render the populated object as JSON, keys in declared order.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, slot) in &self.slots {
            map.insert(name.clone(), slot.value.to_json());
        }
        Value::Object(map)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor {
                name: "flag".into(),
                spec: TypeSpec::Nullable(Box::new(TypeSpec::Bool)),
                nullable: true,
                default: Some(FieldValue::Null),
                constructor_arg: false,
                writable: true,
            },
            PropertyDescriptor {
                name: "count".into(),
                spec: TypeSpec::Int,
                nullable: false,
                default: Some(FieldValue::Int(0)),
                constructor_arg: false,
                writable: true,
            },
            PropertyDescriptor {
                name: "id".into(),
                spec: TypeSpec::String,
                nullable: false,
                default: None,
                constructor_arg: false,
                writable: false,
            },
        ]
    }

    #[test]
    fn allocation_fills_slots_with_defaults() {
        let inst = Instance::allocate("T", &descriptors());
        assert_eq!(inst.get("flag"), Some(&FieldValue::Null));
        assert_eq!(inst.get("count"), Some(&FieldValue::Int(0)));
        // no default declared → unset state is null
        assert_eq!(inst.get("id"), Some(&FieldValue::Null));
        let names: Vec<&str> = inst.property_names().collect();
        assert_eq!(names, ["flag", "count", "id"]);
    }

    #[test]
    fn set_field_rejects_unknown_and_read_only() {
        let mut inst = Instance::allocate("T", &descriptors());
        assert_eq!(
            inst.set_field("nope", FieldValue::Int(1)),
            Err(CoercionFailureKind::UnknownProperty)
        );
        assert_eq!(
            inst.set_field("id", FieldValue::Str("x".into())),
            Err(CoercionFailureKind::NotWritable)
        );
    }

    #[test]
    fn mismatched_assignment_leaves_slot_untouched() {
        let mut inst = Instance::allocate("T", &descriptors());
        let err = inst.set_field("count", FieldValue::Str("5".into())).unwrap_err();
        assert!(matches!(err, CoercionFailureKind::TypeMismatch { .. }));
        assert_eq!(inst.get("count"), Some(&FieldValue::Int(0)));
    }

    #[test]
    fn successful_assignment_commits_whole_value() {
        let mut inst = Instance::allocate("T", &descriptors());
        inst.set_field("flag", FieldValue::Bool(true)).unwrap();
        assert_eq!(inst.get("flag"), Some(&FieldValue::Bool(true)));
    }
}
