// src/common/response/data.rs

use chrono::{DateTime, Local};

/// One decoded float and the field it belongs to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldValue {
    pub name: &'static str,
    pub value: f64,
}

/// All fields of one field group, decoded from CRC-valid words.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup {
    pub name: &'static str,
    pub unit: &'static str,
    pub values: Vec<FieldValue>,
}

impl FieldGroup {
    /// Value of the named field, if the group has it.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.iter().find(|v| v.name == field).map(|v| v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter()
    }
}

/// A complete, fully validated sample from one sensor.
///
/// Only built when every field group of the response passed its checksums, so
/// none of the values can be stale or partially decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Moment the response was read from the bus.
    pub timestamp: DateTime<Local>,
    pub groups: Vec<FieldGroup>,
}

impl Measurement {
    pub fn group(&self, name: &str) -> Option<&FieldGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Shorthand for `group(group)?.get(field)`.
    pub fn value(&self, group: &str, field: &str) -> Option<f64> {
        self.group(group)?.get(field)
    }

    pub fn unit(&self, group: &str) -> Option<&'static str> {
        self.group(group).map(|g| g.unit)
    }

    /// Flattens the record to `("group.field", value)` pairs in wire order,
    /// handy as CSV columns.
    pub fn fields(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.groups.iter().flat_map(|group| {
            group
                .values
                .iter()
                .map(move |field| (format!("{}.{}", group.name, field.name), field.value))
        })
    }
}

// Serialized as `{"timestamp": .., "<group>": {"<field>": ..}, "<group>_unit": ..}`,
// the shape downstream publishers already consume.
#[cfg(feature = "serde")]
mod serialize {
    use super::{FieldGroup, Measurement};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    impl Serialize for FieldGroup {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.values.len()))?;
            for field in &self.values {
                map.serialize_entry(field.name, &field.value)?;
            }
            map.end()
        }
    }

    impl Serialize for Measurement {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(1 + 2 * self.groups.len()))?;
            map.serialize_entry("timestamp", &self.timestamp)?;
            for group in &self.groups {
                map.serialize_entry(group.name, group)?;
            }
            for group in &self.groups {
                map.serialize_entry(&format!("{}_unit", group.name), group.unit)?;
            }
            map.end()
        }
    }
}
