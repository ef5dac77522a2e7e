//! Conversion between semantic values and the host's container form

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::Entity;
use crate::error::{ExtensibleStorageError, Result};
use crate::models::{Field, FieldType, MapKey, Schema, Value, ValueType};
use crate::storage::{Host, RawField, RawValue};
use crate::validation::determine_field_type;

/// Convert a value into the typed container the host stores for a field
///
/// Arrays and maps must be homogeneous. An empty container takes the field's
/// types. Nested entities are stored in their raw form.
pub fn convert_to_generic(field: &Field, value: Value) -> Result<RawField> {
    let expected = determine_field_type(field)?;
    let actual = value.describe();

    match (expected, value) {
        (FieldType::Simple(value_type), value) if value.value_type() == Some(value_type) => {
            Ok(RawField::Simple(scalar_to_raw(field, value)?))
        }
        (FieldType::Array(value_type), Value::Array(items)) => {
            check_element_types(field, expected, items.iter().map(Value::value_type), value_type)?;
            let items = items
                .into_iter()
                .map(|item| scalar_to_raw(field, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(RawField::Array { value_type, items })
        }
        (FieldType::Map { key, value: value_type }, Value::Map(entries)) => {
            check_element_types(field, expected, entries.keys().map(|k| Some(k.value_type())), key)?;
            check_element_types(field, expected, entries.values().map(Value::value_type), value_type)?;
            let entries = entries
                .into_iter()
                .map(|(key, item)| scalar_to_raw(field, item).map(|raw| (key, raw)))
                .collect::<Result<BTreeMap<MapKey, RawValue>>>()?;
            Ok(RawField::Map {
                key_type: key,
                value_type,
                entries,
            })
        }
        (expected, _) => Err(ExtensibleStorageError::FieldTypeMismatchError {
            field: field.name().to_string(),
            expected: expected.to_string(),
            actual,
        }),
    }
}

// `None` stands for a nested container, which never resolves to a value type.
fn check_element_types(
    field: &Field,
    expected: FieldType,
    types: impl Iterator<Item = Option<ValueType>>,
    declared: ValueType,
) -> Result<()> {
    let found: BTreeSet<Option<ValueType>> = types.collect();

    if found.contains(&None) {
        return Err(ExtensibleStorageError::HeterogeneousContainerError(format!(
            "field '{}' holds nested containers",
            field.name()
        )));
    }
    if found.len() > 1 {
        let names: Vec<String> = found.iter().flatten().map(ToString::to_string).collect();
        return Err(ExtensibleStorageError::HeterogeneousContainerError(format!(
            "field '{}' mixes {}",
            field.name(),
            names.join(", ")
        )));
    }
    match found.into_iter().flatten().next() {
        Some(actual) if actual != declared => Err(ExtensibleStorageError::FieldTypeMismatchError {
            field: field.name().to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

fn scalar_to_raw(field: &Field, value: Value) -> Result<RawValue> {
    Ok(match value {
        Value::Int32(v) => RawValue::Int32(v),
        Value::Int16(v) => RawValue::Int16(v),
        Value::Byte(v) => RawValue::Byte(v),
        Value::Double(v) => RawValue::Double(v),
        Value::Single(v) => RawValue::Single(v),
        Value::Boolean(v) => RawValue::Boolean(v),
        Value::String(v) => RawValue::String(v),
        Value::Guid(v) => RawValue::Guid(v),
        Value::ElementId(v) => RawValue::ElementId(v),
        Value::Xyz(v) => RawValue::Xyz(v),
        Value::Uv(v) => RawValue::Uv(v),
        Value::Entity(entity) => RawValue::Entity(entity.into_raw()),
        Value::Array(_) | Value::Map(_) => {
            return Err(ExtensibleStorageError::HeterogeneousContainerError(format!(
                "field '{}' holds nested containers",
                field.name()
            )));
        }
    })
}

/// Reshape a host container into a semantic value
///
/// Nested entities are wrapped with their schema; an entity whose schema is
/// no longer registered is reported as stale. Invalid (unset) entities are
/// returned as they are.
pub(crate) fn reshape(host: &Arc<dyn Host>, field: &Field, raw: RawField) -> Result<Value> {
    match raw {
        RawField::Simple(value) => raw_to_value(host, field, value),
        RawField::Array { items, .. } => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| raw_to_value(host, field, item))
                .collect::<Result<Vec<_>>>()?,
        )),
        RawField::Map { entries, .. } => Ok(Value::Map(
            entries
                .into_iter()
                .map(|(key, item)| raw_to_value(host, field, item).map(|value| (key, value)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        )),
    }
}

fn raw_to_value(host: &Arc<dyn Host>, field: &Field, raw: RawValue) -> Result<Value> {
    Ok(match raw {
        RawValue::Int32(v) => Value::Int32(v),
        RawValue::Int16(v) => Value::Int16(v),
        RawValue::Byte(v) => Value::Byte(v),
        RawValue::Double(v) => Value::Double(v),
        RawValue::Single(v) => Value::Single(v),
        RawValue::Boolean(v) => Value::Boolean(v),
        RawValue::String(v) => Value::String(v),
        RawValue::Guid(v) => Value::Guid(v),
        RawValue::ElementId(v) => Value::ElementId(v),
        RawValue::Xyz(v) => Value::Xyz(v),
        RawValue::Uv(v) => Value::Uv(v),
        RawValue::Entity(entity) if !entity.has_schema() => {
            let guid = field.sub_schema_guid().unwrap_or_default();
            let schema = host
                .lookup(guid)
                .unwrap_or_else(|| Arc::new(Schema::unregistered(guid)));
            Value::Entity(Entity::from_raw(host.clone(), schema, entity))
        }
        RawValue::Entity(entity) => {
            let guid = entity.schema_guid();
            let schema = host
                .lookup(guid)
                .ok_or(ExtensibleStorageError::StaleEntityError(guid))?;
            Value::Entity(Entity::from_raw(host.clone(), schema, entity))
        }
    })
}
