//! Schema binding
//!
//! - builder: drives the host schema builder from a description
//! - registry: memoized build-or-lookup and bound schema accessors
//! - loader: declarative YAML/JSON schema documents

pub mod builder;
pub mod loader;
pub mod registry;

pub use builder::build_schema;
pub use loader::SchemaLoader;
pub use registry::{BoundSchema, SchemaCatalog, list_similar_schemas};
