//! Host-side entity data
//!
//! A [`RawEntity`] is what the host stores on an element: the schema GUID and
//! one typed container per field. All host type and unit checks happen here.

use std::collections::BTreeMap;
use uuid::Uuid;

use super::StorageError;
use crate::models::{ElementId, Field, FieldType, MapKey, UnitTypeId, Uv, ValueType, Xyz};

/// A scalar as the host stores it
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int32(i32),
    Int16(i16),
    Byte(u8),
    Double(f64),
    Single(f32),
    Boolean(bool),
    String(String),
    Guid(Uuid),
    ElementId(ElementId),
    Xyz(Xyz),
    Uv(Uv),
    Entity(RawEntity),
}

impl RawValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            RawValue::Int32(_) => ValueType::Int32,
            RawValue::Int16(_) => ValueType::Int16,
            RawValue::Byte(_) => ValueType::Byte,
            RawValue::Double(_) => ValueType::Double,
            RawValue::Single(_) => ValueType::Single,
            RawValue::Boolean(_) => ValueType::Boolean,
            RawValue::String(_) => ValueType::String,
            RawValue::Guid(_) => ValueType::Guid,
            RawValue::ElementId(_) => ValueType::ElementId,
            RawValue::Xyz(_) => ValueType::Xyz,
            RawValue::Uv(_) => ValueType::Uv,
            RawValue::Entity(_) => ValueType::Entity,
        }
    }

    /// Zero, false, empty or invalid, depending on the type
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Int32 => RawValue::Int32(0),
            ValueType::Int16 => RawValue::Int16(0),
            ValueType::Byte => RawValue::Byte(0),
            ValueType::Double => RawValue::Double(0.0),
            ValueType::Single => RawValue::Single(0.0),
            ValueType::Boolean => RawValue::Boolean(false),
            ValueType::String => RawValue::String(String::new()),
            ValueType::Guid => RawValue::Guid(Uuid::nil()),
            ValueType::ElementId => RawValue::ElementId(ElementId::INVALID),
            ValueType::Xyz => RawValue::Xyz(Xyz::ZERO),
            ValueType::Uv => RawValue::Uv(Uv::ZERO),
            ValueType::Entity => RawValue::Entity(RawEntity::invalid()),
        }
    }
}

/// A field value in the host's typed container form
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    Simple(RawValue),
    Array {
        value_type: ValueType,
        items: Vec<RawValue>,
    },
    Map {
        key_type: ValueType,
        value_type: ValueType,
        entries: BTreeMap<MapKey, RawValue>,
    },
}

impl RawField {
    pub fn field_type(&self) -> FieldType {
        match self {
            RawField::Simple(value) => FieldType::Simple(value.value_type()),
            RawField::Array { value_type, .. } => FieldType::Array(*value_type),
            RawField::Map {
                key_type,
                value_type,
                ..
            } => FieldType::Map {
                key: *key_type,
                value: *value_type,
            },
        }
    }

    /// The value a field holds before it is first set or after it is cleared
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Simple(value_type) => RawField::Simple(RawValue::default_for(value_type)),
            FieldType::Array(value_type) => RawField::Array {
                value_type,
                items: Vec::new(),
            },
            FieldType::Map { key, value } => RawField::Map {
                key_type: key,
                value_type: value,
                entries: BTreeMap::new(),
            },
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &RawValue> + '_> {
        match self {
            RawField::Simple(value) => Box::new(std::iter::once(value)),
            RawField::Array { items, .. } => Box::new(items.iter()),
            RawField::Map { entries, .. } => Box::new(entries.values()),
        }
    }
}

/// An entity as stored by the host
///
/// An entity with the nil schema GUID is invalid: it is what an unset
/// entity-valued field holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEntity {
    schema_guid: Uuid,
    values: BTreeMap<String, RawField>,
}

impl RawEntity {
    pub fn new(schema_guid: Uuid) -> Self {
        Self {
            schema_guid,
            values: BTreeMap::new(),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn schema_guid(&self) -> Uuid {
        self.schema_guid
    }

    pub fn has_schema(&self) -> bool {
        !self.schema_guid.is_nil()
    }

    /// Whether the field has been set since creation or the last clear
    pub fn contains(&self, field_name: &str) -> bool {
        self.values.contains_key(field_name)
    }

    /// Read a field, falling back to its default when unset
    pub fn get(&self, field: &Field, unit: &UnitTypeId) -> Result<RawField, StorageError> {
        self.check_field(field)?;
        check_unit(field, unit)?;
        Ok(match self.values.get(field.name()) {
            Some(value) => value.clone(),
            None => RawField::default_for(host_field_type(field)?),
        })
    }

    /// Write a field after checking its type, sub-schema and unit
    pub fn set(
        &mut self,
        field: &Field,
        value: RawField,
        unit: &UnitTypeId,
    ) -> Result<(), StorageError> {
        self.check_field(field)?;
        check_unit(field, unit)?;

        let expected = host_field_type(field)?;
        let actual = value.field_type();
        if expected != actual {
            return Err(StorageError::TypeMismatch {
                field: field.name().to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        check_contents(field, &value)?;

        // An invalid entity is the default of a simple entity field
        if let RawField::Simple(RawValue::Entity(entity)) = &value
            && !entity.has_schema()
        {
            self.values.remove(field.name());
            return Ok(());
        }
        self.values.insert(field.name().to_string(), value);
        Ok(())
    }

    /// Reset a field to its default
    pub fn clear(&mut self, field: &Field) -> Result<(), StorageError> {
        self.check_field(field)?;
        self.values.remove(field.name());
        Ok(())
    }

    fn check_field(&self, field: &Field) -> Result<(), StorageError> {
        if field.schema_guid() != self.schema_guid {
            return Err(StorageError::UnknownField {
                schema: self.schema_guid,
                field: field.name().to_string(),
            });
        }
        Ok(())
    }
}

fn host_field_type(field: &Field) -> Result<FieldType, StorageError> {
    crate::validation::determine_field_type(field)
        .map_err(|err| StorageError::BackendError(err.to_string()))
}

fn check_unit(field: &Field, unit: &UnitTypeId) -> Result<(), StorageError> {
    if field.compatible_unit(unit) {
        Ok(())
    } else {
        Err(StorageError::IncompatibleUnit {
            field: field.name().to_string(),
            unit: unit.clone(),
        })
    }
}

// Every element and key must match the container's declared types. Nested
// entities are either invalid or entities of the field's sub-schema.
fn check_contents(field: &Field, value: &RawField) -> Result<(), StorageError> {
    let expected_value = field.value_type();
    for item in value.values() {
        if item.value_type() != expected_value {
            return Err(StorageError::TypeMismatch {
                field: field.name().to_string(),
                expected: expected_value.to_string(),
                actual: item.value_type().to_string(),
            });
        }
        if let RawValue::Entity(entity) = item
            && entity.has_schema()
        {
            let expected = field.sub_schema_guid().unwrap_or_default();
            if entity.schema_guid() != expected {
                return Err(StorageError::SubSchemaMismatch {
                    field: field.name().to_string(),
                    expected,
                    actual: entity.schema_guid(),
                });
            }
        }
    }

    if let RawField::Map {
        key_type, entries, ..
    } = value
        && let Some(key) = entries.keys().find(|key| key.value_type() != *key_type)
    {
        return Err(StorageError::TypeMismatch {
            field: field.name().to_string(),
            expected: key_type.to_string(),
            actual: key.value_type().to_string(),
        });
    }
    Ok(())
}
