//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Arc;

use extensible_storage::models::{FieldDescriptor, SchemaDescription, SpecTypeId};
use extensible_storage::schema::SchemaCatalog;
use extensible_storage::storage::{MemoryDocument, MemoryHost};
use uuid::Uuid;

/// Deterministic GUID for a fixture name
pub fn guid(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub document: MemoryDocument,
    pub catalog: SchemaCatalog,
}

pub fn fixture() -> Fixture {
    let host = Arc::new(MemoryHost::new());
    Fixture {
        document: MemoryDocument::new(host.clone()),
        catalog: SchemaCatalog::new(host.clone()),
        host,
    }
}

/// Metadata v1: a:int32, b:string, c:double
pub fn metadata_v1() -> SchemaDescription {
    SchemaDescription::new(guid("metadata-v1"), "Metadata")
        .with_documentation("Project metadata")
        .with_field(FieldDescriptor::simple("a", "int32").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::simple("b", "string").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::simple("c", "double").unwrap())
        .unwrap()
}

/// Metadata v2: a:int32, b:int32, d:double
pub fn metadata_v2() -> SchemaDescription {
    SchemaDescription::new(guid("metadata-v2"), "Metadata")
        .with_documentation("Project metadata, revised")
        .with_field(FieldDescriptor::simple("a", "int32").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::simple("b", "int32").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::simple("d", "double").unwrap())
        .unwrap()
}

/// A schema covering every value type as a simple field, plus containers
pub fn everything(child: Uuid) -> SchemaDescription {
    let mut description = SchemaDescription::new(guid("everything"), "Everything");
    for (name, value_type) in [
        ("int32", "int32"),
        ("int16", "int16"),
        ("byte", "byte"),
        ("double", "double"),
        ("single", "single"),
        ("boolean", "boolean"),
        ("string", "string"),
        ("guid", "guid"),
        ("element_id", "element_id"),
        ("xyz", "xyz"),
        ("uv", "uv"),
    ] {
        description = description
            .with_field(FieldDescriptor::simple(name, value_type).unwrap())
            .unwrap();
    }
    description
        .with_field(FieldDescriptor::simple("child", "entity").unwrap().with_sub_schema(child))
        .unwrap()
        .with_field(FieldDescriptor::simple("length", "double").unwrap().with_spec(SpecTypeId::LENGTH))
        .unwrap()
        .with_field(FieldDescriptor::array("tags", "string").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::array("points", "xyz").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::array("children", "entity").unwrap().with_sub_schema(child))
        .unwrap()
        .with_field(FieldDescriptor::map("scores", "string", "double").unwrap())
        .unwrap()
        .with_field(FieldDescriptor::map("owners", "element_id", "guid").unwrap())
        .unwrap()
}

/// Nested schema used by entity-valued fields
pub fn child() -> SchemaDescription {
    SchemaDescription::new(guid("child"), "Child")
        .with_field(FieldDescriptor::simple("label", "string").unwrap())
        .unwrap()
}
