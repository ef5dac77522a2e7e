//! Host storage abstraction
//!
//! Defines the traits the typed layer uses to talk to the host's extensible
//! storage facility, and an in-memory implementation of them:
//! - SchemaRegistry / SchemaBuilder / FieldBuilder: schema lookup and construction
//! - UnitCatalog: measurement specs and their units
//! - Element / Transaction: entity persistence on host elements
//! - MemoryHost / MemoryDocument: in-process host (for tests and embedding)

use uuid::Uuid;

use crate::error::ExtensibleStorageError;
use crate::models::{
    AccessLevel, ElementId, Field, Schema, SchemaHandle, SpecTypeId, UnitTypeId, ValueType,
};

pub mod document;
pub mod memory;
pub mod raw;

pub use document::{MemoryDocument, MemoryElement, MemoryTransaction};
pub use memory::{CallerContext, MemoryHost};
pub use raw::{RawEntity, RawField, RawValue};

/// Error type for host storage operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Name rejected by host: {0}")]
    NameRejected(String),
    #[error("Invalid GUID: {0}")]
    InvalidGuid(Uuid),
    #[error("Schema already registered: {0}")]
    DuplicateSchema(Uuid),
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
    #[error("Type cannot be used as map key: {0}")]
    InvalidKeyType(String),
    #[error("Field does not take units: {0}")]
    UnitsNotApplicable(String),
    #[error("Schema is incomplete: {0}")]
    IncompleteSchema(String),
    #[error("Schema not found: {0}")]
    SchemaNotFound(Uuid),
    #[error("Field '{field}' is not part of schema {schema}")]
    UnknownField { schema: Uuid, field: String },
    #[error("Type mismatch on field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("Sub-entity of field '{field}' must use schema {expected}, got {actual}")]
    SubSchemaMismatch {
        field: String,
        expected: Uuid,
        actual: Uuid,
    },
    #[error("Unit {unit} is not compatible with field '{field}'")]
    IncompatibleUnit { field: String, unit: UnitTypeId },
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("No open transaction: {0}")]
    NoOpenTransaction(String),
    #[error("Transaction already in progress: {0}")]
    TransactionInProgress(String),
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// The host's schema registry
///
/// Schemas are immutable once registered. Access checks are answered for the
/// caller context at the time of the call.
pub trait SchemaRegistry: Send + Sync {
    /// Check whether a GUID may identify a schema
    fn guid_is_valid(&self, guid: Uuid) -> bool;

    /// Check whether a vendor id is well formed
    fn vendor_id_is_valid(&self, vendor_id: &str) -> bool;

    /// Look up a registered schema
    fn lookup(&self, guid: Uuid) -> Option<SchemaHandle>;

    /// List every registered schema
    fn list_schemas(&self) -> Vec<SchemaHandle>;

    /// Open a builder for a new schema with the given GUID
    fn schema_builder(&self, guid: Uuid) -> Result<Box<dyn SchemaBuilder + '_>, StorageError>;

    /// Whether the current caller may read entities of the schema
    fn read_access_granted(&self, schema: &Schema) -> bool;

    /// Whether the current caller may write entities of the schema
    fn write_access_granted(&self, schema: &Schema) -> bool;
}

/// Measurement specs and units known to the host
pub trait UnitCatalog: Send + Sync {
    /// Whether values of this spec are measured in units
    fn is_measurable_spec(&self, spec: &SpecTypeId) -> bool;

    /// Units accepted for a spec, preferred unit first
    fn valid_units(&self, spec: &SpecTypeId) -> Vec<UnitTypeId>;

    /// Unit used when a field is accessed without an explicit unit
    ///
    /// No spec gives the empty unit, the number spec the general unit and a
    /// measurable spec its preferred unit.
    fn default_unit(&self, field: &Field) -> UnitTypeId {
        match field.spec() {
            None => UnitTypeId::EMPTY,
            Some(spec) if *spec == SpecTypeId::NUMBER => UnitTypeId::GENERAL,
            Some(spec) if self.is_measurable_spec(spec) => self
                .valid_units(spec)
                .into_iter()
                .next()
                .or_else(|| field.valid_units().first().cloned())
                .unwrap_or_default(),
            Some(_) => UnitTypeId::EMPTY,
        }
    }
}

/// Everything the typed layer needs from the host
pub trait Host: SchemaRegistry + UnitCatalog {}

impl<T: SchemaRegistry + UnitCatalog + ?Sized> Host for T {}

/// Builds one schema, then registers it on `finish`
///
/// Dropping a builder without finishing it registers nothing.
pub trait SchemaBuilder {
    /// Check a schema or field name against the host naming rules
    fn acceptable_name(&self, name: &str) -> bool;

    fn set_schema_name(&mut self, name: &str) -> Result<(), StorageError>;

    fn set_documentation(&mut self, documentation: &str);

    fn set_read_access_level(&mut self, level: AccessLevel);

    fn set_write_access_level(&mut self, level: AccessLevel);

    fn set_vendor_id(&mut self, vendor_id: &str) -> Result<(), StorageError>;

    fn set_application_guid(&mut self, guid: Uuid) -> Result<(), StorageError>;

    fn add_simple_field(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError>;

    fn add_array_field(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError>;

    fn add_map_field(
        &mut self,
        name: &str,
        key_type: ValueType,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError>;

    /// Register the schema and return its handle
    fn finish(self: Box<Self>) -> Result<SchemaHandle, StorageError>;
}

/// Configures one field of a schema under construction
pub trait FieldBuilder {
    fn set_documentation(&mut self, documentation: &str);

    /// Whether the host requires a spec for this field
    fn needs_units(&self) -> bool;

    fn set_spec(&mut self, spec: &SpecTypeId) -> Result<(), StorageError>;

    /// Whether the host requires a sub-schema GUID for this field
    fn needs_sub_schema_guid(&self) -> bool;

    fn set_sub_schema_guid(&mut self, guid: Uuid) -> Result<(), StorageError>;
}

/// A named host transaction
///
/// A transaction dropped without commit is rolled back.
pub trait Transaction {
    /// Identifies this transaction among all transactions of the host
    fn id(&self) -> u64;

    fn name(&self) -> &str;

    fn commit(self: Box<Self>) -> Result<(), StorageError>;

    fn roll_back(self: Box<Self>);
}

/// A host object owning at most one entity per schema
pub trait Element {
    fn id(&self) -> ElementId;

    fn name(&self) -> String;

    /// Retrieve a copy of the entity stored under the schema, if any
    fn get_entity(&self, schema: &Schema) -> Result<Option<RawEntity>, StorageError>;

    /// Store an entity, replacing the one under the same schema
    fn set_entity(
        &self,
        transaction: &dyn Transaction,
        entity: &RawEntity,
    ) -> Result<(), StorageError>;

    /// Remove the entity stored under the schema
    fn delete_entity(
        &self,
        transaction: &dyn Transaction,
        schema: &Schema,
    ) -> Result<(), StorageError>;

    fn start_transaction(&self, name: &str) -> Result<Box<dyn Transaction + '_>, StorageError>;

    /// GUIDs of the schemas of all entities stored on this element
    fn schema_guids(&self) -> Vec<Uuid>;
}

/// Run `f` inside a named transaction on the element's document
///
/// Commits when `f` succeeds and rolls back when it fails.
pub fn run_in_transaction<E, T, F>(
    element: &E,
    name: &str,
    f: F,
) -> Result<T, ExtensibleStorageError>
where
    E: Element + ?Sized,
    F: FnOnce(&dyn Transaction) -> Result<T, ExtensibleStorageError>,
{
    let transaction = element.start_transaction(name)?;
    match f(transaction.as_ref()) {
        Ok(value) => {
            transaction.commit()?;
            Ok(value)
        }
        Err(err) => {
            transaction.roll_back();
            Err(err)
        }
    }
}
