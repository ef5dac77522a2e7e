//! Field declarations and host field handles

use serde::Serialize;
use uuid::Uuid;

use super::types::{ContainerType, FieldType, SpecTypeId, UnitTypeId, ValueType};
use crate::error::{ExtensibleStorageError, Result};
use crate::validation::{TypeInput, resolve_key_type, resolve_value_type};

/// Declares one field of a schema
///
/// Construction resolves the value and key types, so a descriptor that exists
/// always has exactly one container kind and a key type iff it is a map.
///
/// # Example
///
/// ```rust
/// use extensible_storage::models::{FieldDescriptor, SpecTypeId};
///
/// let width = FieldDescriptor::simple("width", "double")
///     .unwrap()
///     .with_spec(SpecTypeId::LENGTH)
///     .with_documentation("Clear opening width");
/// assert_eq!(width.name(), "width");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    name: String,
    container_type: ContainerType,
    value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<SpecTypeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_schema_guid: Option<Uuid>,
    documentation: String,
}

impl FieldDescriptor {
    /// Declare a field of any container kind
    ///
    /// Fails with `MissingKeyTypeError` for a map without key type and with
    /// `UnexpectedKeyTypeError` for a key type on any other container.
    pub fn new(
        name: impl Into<String>,
        container_type: ContainerType,
        value_type: impl Into<TypeInput>,
        key_type: Option<TypeInput>,
    ) -> Result<Self> {
        let name = name.into();
        let value_type = resolve_value_type(value_type)?;

        let key_type = match (container_type, key_type) {
            (ContainerType::Map, Some(key)) => Some(resolve_key_type(key)?),
            (ContainerType::Map, None) => {
                return Err(ExtensibleStorageError::MissingKeyTypeError(name));
            }
            (_, Some(_)) => return Err(ExtensibleStorageError::UnexpectedKeyTypeError(name)),
            (_, None) => None,
        };

        Ok(Self {
            name,
            container_type,
            value_type,
            key_type,
            spec: None,
            sub_schema_guid: None,
            documentation: String::new(),
        })
    }

    pub fn simple(name: impl Into<String>, value_type: impl Into<TypeInput>) -> Result<Self> {
        Self::new(name, ContainerType::Simple, value_type, None)
    }

    pub fn array(name: impl Into<String>, value_type: impl Into<TypeInput>) -> Result<Self> {
        Self::new(name, ContainerType::Array, value_type, None)
    }

    pub fn map(
        name: impl Into<String>,
        key_type: impl Into<TypeInput>,
        value_type: impl Into<TypeInput>,
    ) -> Result<Self> {
        Self::new(name, ContainerType::Map, value_type, Some(key_type.into()))
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Measurement spec; unit-requiring fields default to [`SpecTypeId::NUMBER`]
    pub fn with_spec(mut self, spec: SpecTypeId) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Schema of the entities stored in an entity-valued field
    pub fn with_sub_schema(mut self, guid: Uuid) -> Self {
        self.sub_schema_guid = Some(guid);
        self
    }

    /// Declaration checks that depend on more than one attribute
    pub fn validate(&self) -> Result<()> {
        if self.value_type == ValueType::Entity
            && self.sub_schema_guid.is_none_or(|guid| guid.is_nil())
        {
            return Err(ExtensibleStorageError::MissingSubSchemaError(
                self.name.clone(),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn key_type(&self) -> Option<ValueType> {
        self.key_type
    }

    pub fn spec(&self) -> Option<&SpecTypeId> {
        self.spec.as_ref()
    }

    pub fn sub_schema_guid(&self) -> Option<Uuid> {
        self.sub_schema_guid
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The container type token of this declaration
    pub fn field_type(&self) -> FieldType {
        match (self.container_type, self.key_type) {
            (ContainerType::Map, Some(key)) => FieldType::Map {
                key,
                value: self.value_type,
            },
            (ContainerType::Array, _) => FieldType::Array(self.value_type),
            _ => FieldType::Simple(self.value_type),
        }
    }
}

/// A field of a finished host schema
///
/// Host implementations construct these when a schema builder finishes; the
/// core only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    schema_guid: Uuid,
    name: String,
    container_type: ContainerType,
    value_type: ValueType,
    key_type: Option<ValueType>,
    spec: Option<SpecTypeId>,
    valid_units: Vec<UnitTypeId>,
    sub_schema_guid: Option<Uuid>,
    documentation: String,
}

impl Field {
    pub fn new(
        schema_guid: Uuid,
        name: impl Into<String>,
        container_type: ContainerType,
        value_type: ValueType,
    ) -> Self {
        Self {
            schema_guid,
            name: name.into(),
            container_type,
            value_type,
            key_type: None,
            spec: None,
            valid_units: Vec::new(),
            sub_schema_guid: None,
            documentation: String::new(),
        }
    }

    pub fn with_key_type(mut self, key_type: ValueType) -> Self {
        self.key_type = Some(key_type);
        self
    }

    /// Spec of the field and the units the host accepts for it
    pub fn with_spec(mut self, spec: SpecTypeId, valid_units: Vec<UnitTypeId>) -> Self {
        self.spec = Some(spec);
        self.valid_units = valid_units;
        self
    }

    pub fn with_sub_schema_guid(mut self, guid: Uuid) -> Self {
        self.sub_schema_guid = Some(guid);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// GUID of the schema this field belongs to
    pub fn schema_guid(&self) -> Uuid {
        self.schema_guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn key_type(&self) -> Option<ValueType> {
        self.key_type
    }

    /// Measurement spec of the values stored in this field
    pub fn spec(&self) -> Option<&SpecTypeId> {
        self.spec.as_ref()
    }

    pub fn valid_units(&self) -> &[UnitTypeId] {
        &self.valid_units
    }

    /// The GUID of the schema describing the sub-entities stored in this field
    pub fn sub_schema_guid(&self) -> Option<Uuid> {
        self.sub_schema_guid
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Checks if the unit is compatible with the field description
    ///
    /// Fields without units only accept the empty unit.
    pub fn compatible_unit(&self, unit: &UnitTypeId) -> bool {
        if self.valid_units.is_empty() {
            unit.is_empty()
        } else {
            self.valid_units.contains(unit)
        }
    }
}

/// A field referenced either by name or by handle
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Name(&'a str),
    Field(&'a Field),
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(name: &'a str) -> Self {
        FieldRef::Name(name)
    }
}

impl<'a> From<&'a String> for FieldRef<'a> {
    fn from(name: &'a String) -> Self {
        FieldRef::Name(name)
    }
}

impl<'a> From<&'a Field> for FieldRef<'a> {
    fn from(field: &'a Field) -> Self {
        FieldRef::Field(field)
    }
}
