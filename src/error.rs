//! Error types for schema declaration, schema building and entity access

use uuid::Uuid;

use crate::storage::StorageError;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ExtensibleStorageError>;

/// Errors raised by the typed schema and entity layer
///
/// Every variant is a local validation or contract failure. None of them are
/// retried; they abort the enclosing build, get or set immediately.
#[derive(Debug, thiserror::Error)]
pub enum ExtensibleStorageError {
    /// A type name or token outside the allowed value/key type set
    #[error("Invalid data type '{0}'")]
    UnsupportedTypeError(String),

    /// A field whose container kind cannot be mapped to a type token
    #[error("Invalid field container type: {0}")]
    InvalidContainerKindError(String),

    #[error("Invalid schema GUID '{0}'")]
    InvalidSchemaIdError(String),

    #[error("Invalid schema name '{0}'")]
    InvalidSchemaNameError(String),

    #[error("Invalid access level '{level}': {reason}")]
    InvalidAccessLevelError { level: String, reason: String },

    #[error("Invalid Vendor ID '{0}'")]
    InvalidVendorIdError(String),

    #[error("Invalid Application GUID '{0}'")]
    InvalidApplicationIdError(String),

    #[error("Invalid field name '{0}'")]
    InvalidFieldNameError(String),

    /// Map field declared without a key type
    #[error("Missing key type for Map field '{0}'")]
    MissingKeyTypeError(String),

    /// Key type declared on a Simple or Array field
    #[error("Key type is only allowed on Map fields, found one on '{0}'")]
    UnexpectedKeyTypeError(String),

    /// Entity-valued field declared without the schema of its sub-entities
    #[error("A valid sub schema GUID must be provided for field '{0}'")]
    MissingSubSchemaError(String),

    #[error("Field '{field}' does not belong to schema '{schema}'")]
    UnknownFieldError { schema: String, field: String },

    #[error("Invalid type for field '{field}': expected {expected} but got {actual}")]
    FieldTypeMismatchError {
        field: String,
        expected: String,
        actual: String,
    },

    /// Array or map whose elements do not resolve to one allowed type
    #[error("Container value has mixed or unsupported element types: {0}")]
    HeterogeneousContainerError(String),

    /// Entity whose schema is no longer registered with the host
    #[error("Entity schema {0} is not registered with the host")]
    StaleEntityError(Uuid),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}
