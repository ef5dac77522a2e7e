//! Type resolution
//!
//! Maps the declaration vocabulary (snake_case short names, generic aliases
//! and native type tokens) onto the closed set of value and key types, and
//! derives the container type token the host stores for a field.

use tracing::debug;

use crate::error::{ExtensibleStorageError, Result};
use crate::models::{ContainerType, Field, FieldRef, FieldType, Schema, ValueType};

/// Input accepted by the type resolvers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInput {
    /// An already-resolved token
    Token(ValueType),
    /// A short name such as `int32`, `element_id` or an alias such as `text`
    Name(String),
}

impl From<ValueType> for TypeInput {
    fn from(token: ValueType) -> Self {
        TypeInput::Token(token)
    }
}

impl From<&str> for TypeInput {
    fn from(name: &str) -> Self {
        TypeInput::Name(name.to_string())
    }
}

impl From<String> for TypeInput {
    fn from(name: String) -> Self {
        TypeInput::Name(name)
    }
}

impl From<&String> for TypeInput {
    fn from(name: &String) -> Self {
        TypeInput::Name(name.clone())
    }
}

/// Resolve a type input against the allowed value types
pub fn resolve_value_type(input: impl Into<TypeInput>) -> Result<ValueType> {
    resolve_type(input.into(), |_| true)
}

/// Resolve a type input against the allowed key types
pub fn resolve_key_type(input: impl Into<TypeInput>) -> Result<ValueType> {
    resolve_type(input.into(), ValueType::is_key_type)
}

fn resolve_type(input: TypeInput, allowed: impl Fn(&ValueType) -> bool) -> Result<ValueType> {
    let resolved = match &input {
        TypeInput::Token(token) => Some(*token),
        TypeInput::Name(name) => lookup_name(name),
    };

    match resolved {
        Some(value_type) if allowed(&value_type) => Ok(value_type),
        _ => Err(ExtensibleStorageError::UnsupportedTypeError(match input {
            TypeInput::Token(token) => token.to_string(),
            TypeInput::Name(name) => name,
        })),
    }
}

fn lookup_name(name: &str) -> Option<ValueType> {
    if let Some(value_type) = ValueType::ALL.iter().find(|t| t.as_str() == name) {
        return Some(*value_type);
    }

    match name {
        "int" | "integer" => Some(ValueType::Int32),
        "float" | "real" => Some(ValueType::Double),
        "bool" => Some(ValueType::Boolean),
        "str" | "text" => Some(ValueType::String),
        _ => None,
    }
}

/// Determine the container type token the host uses to store a field
///
/// Simple fields store the plain value type, arrays a homogeneous list of it
/// and maps a key-to-value dictionary.
pub fn determine_field_type(field: &Field) -> Result<FieldType> {
    match field.container_type() {
        ContainerType::Simple => Ok(FieldType::Simple(field.value_type())),
        ContainerType::Array => Ok(FieldType::Array(field.value_type())),
        ContainerType::Map => match field.key_type() {
            Some(key) => Ok(FieldType::Map {
                key,
                value: field.value_type(),
            }),
            None => Err(ExtensibleStorageError::InvalidContainerKindError(format!(
                "map field '{}' has no key type",
                field.name()
            ))),
        },
    }
}

/// Resolve a field reference against a schema
///
/// Names are looked up directly. Field handles must belong to the same
/// schema; a handle from another schema is reported as unknown.
pub fn resolve_field<'s>(schema: &'s Schema, field: FieldRef<'_>) -> Result<&'s Field> {
    let (name, owner) = match field {
        FieldRef::Name(name) => (name, None),
        FieldRef::Field(field) => (field.name(), Some(field.schema_guid())),
    };

    match schema.get_field(name) {
        Some(found) if owner.is_none_or(|guid| guid == schema.guid()) => Ok(found),
        _ => {
            debug!("Field '{}' not found in schema '{}'", name, schema.name());
            Err(ExtensibleStorageError::UnknownFieldError {
                schema: schema.name().to_string(),
                field: name.to_string(),
            })
        }
    }
}
