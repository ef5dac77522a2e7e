//! Extensible Storage - Typed schemas and entities over a host storage facility
//!
//! Provides:
//! - Schema declarations with typed fields (scalar, array, map)
//! - Type resolution and host naming rules
//! - Building and memoized binding of host schemas
//! - Typed entity access with migration between schema versions
//! - Host storage traits and an in-memory host

pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod schema;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use config::ScopeConfig;
pub use error::{ExtensibleStorageError, Result};
pub use storage::{
    Element, Host, MemoryDocument, MemoryElement, MemoryHost, SchemaRegistry, StorageError,
    Transaction, UnitCatalog,
};
pub use validation::{resolve_key_type, resolve_value_type};

// Re-export models
pub use models::{
    AccessLevel, ContainerType, ElementId, Field, FieldDescriptor, FieldTable, FieldType, MapKey,
    Schema, SchemaDescription, SchemaHandle, SpecTypeId, UnitTypeId, Uv, Value, ValueType, Xyz,
};

// Re-export schema binding and entity access
pub use entity::{Entity, EntityScope, MigrationReport, with_entity};
pub use schema::{BoundSchema, SchemaCatalog, SchemaLoader, build_schema};
