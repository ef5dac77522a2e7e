//! Models module
//!
//! Defines the data structures shared by declarations, host schemas and
//! entity values:
//! - Type tokens (value, container and field types, access levels, units)
//! - Semantic values and map keys
//! - Field declarations and host field handles
//! - Schema declarations and host schema handles

pub mod field;
pub mod schema;
pub mod types;
pub mod value;

pub use field::{Field, FieldDescriptor, FieldRef};
pub use schema::{FieldTable, Schema, SchemaDescription, SchemaHandle, parse_guid};
pub use types::{
    AccessLevel, ContainerType, ElementId, FieldType, NativeType, SpecTypeId, UnitTypeId, Uv,
    ValueType, Xyz,
};
pub use value::{MapKey, Value};
