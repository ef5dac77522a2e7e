//! Schema building and registry binding tests

use std::sync::Arc;
use std::thread;

use extensible_storage::models::{
    AccessLevel, FieldDescriptor, FieldTable, SchemaDescription, SpecTypeId, UnitTypeId,
};
use extensible_storage::schema::{SchemaLoader, build_schema, list_similar_schemas};
use extensible_storage::storage::{CallerContext, SchemaRegistry, StorageError};
use extensible_storage::{ExtensibleStorageError, MemoryHost, SchemaCatalog};
use uuid::Uuid;

mod common;

mod builder_tests {
    use super::*;

    #[test]
    fn test_build_preserves_declaration() {
        let fixture = common::fixture();
        let schema = build_schema(fixture.host.as_ref(), &common::metadata_v1()).unwrap();

        assert_eq!(schema.name(), "Metadata");
        assert_eq!(schema.documentation(), "Project metadata");
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(schema.get_field("c").unwrap().spec(), Some(&SpecTypeId::NUMBER));
        assert_eq!(schema.get_field("b").unwrap().spec(), None);
    }

    #[test]
    fn test_invalid_schema_name() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "9lives");
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidSchemaNameError(_))
        ));
        assert!(host.list_schemas().is_empty());
    }

    #[test]
    fn test_vendor_access_needs_vendor_id() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "Guarded")
            .with_write_access(AccessLevel::Vendor);
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidAccessLevelError { .. })
        ));

        let description = SchemaDescription::new(Uuid::new_v4(), "Guarded")
            .with_read_access(AccessLevel::Application);
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidAccessLevelError { .. })
        ));
        assert_eq!(host.finished_builds(), 0);
    }

    #[test]
    fn test_invalid_vendor_and_application_ids() {
        let host = MemoryHost::new();
        let description =
            SchemaDescription::new(Uuid::new_v4(), "Vendored").with_vendor_id("not a vendor");
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidVendorIdError(_))
        ));

        let description =
            SchemaDescription::new(Uuid::new_v4(), "Owned").with_application_guid(Uuid::nil());
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidApplicationIdError(_))
        ));
    }

    #[test]
    fn test_provenance_recorded() {
        let host = MemoryHost::new();
        let application = Uuid::new_v4();
        let description = SchemaDescription::new(Uuid::new_v4(), "Owned")
            .with_vendor_id("com.example")
            .with_application_guid(application)
            .with_read_access(AccessLevel::Vendor)
            .with_write_access(AccessLevel::Application);
        let schema = build_schema(&host, &description).unwrap();

        assert_eq!(schema.vendor_id(), Some("com.example"));
        assert_eq!(schema.application_guid(), Some(application));
        assert_eq!(schema.read_access_level(), AccessLevel::Vendor);
        assert_eq!(schema.write_access_level(), AccessLevel::Application);
    }

    #[test]
    fn test_explicit_spec_and_units() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "Sizes")
            .with_field(
                FieldDescriptor::simple("width", "double")
                    .unwrap()
                    .with_spec(SpecTypeId::LENGTH)
                    .with_documentation("Clear width"),
            )
            .unwrap();
        let schema = build_schema(&host, &description).unwrap();
        let width = schema.get_field("width").unwrap();

        assert_eq!(width.documentation(), "Clear width");
        assert!(width.compatible_unit(&UnitTypeId::METERS));
        assert!(!width.compatible_unit(&UnitTypeId::DEGREES));
    }

    #[test]
    fn test_unknown_spec_rejected_by_host() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "Odd")
            .with_field(
                FieldDescriptor::simple("x", "double")
                    .unwrap()
                    .with_spec(SpecTypeId::new("spec:unknown")),
            )
            .unwrap();
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::StorageError(
                StorageError::IncompleteSchema(_)
            ))
        ));
    }

    #[test]
    fn test_composed_fields_base_first() {
        let tracked = FieldTable::new("Tracked")
            .with_field(FieldDescriptor::simple("created_by", "string").unwrap())
            .with_field(FieldDescriptor::simple("revision", "int16").unwrap());
        let description = SchemaDescription::new(Uuid::new_v4(), "Door")
            .include(&tracked)
            .unwrap()
            .with_field(FieldDescriptor::simple("revision", "int32").unwrap())
            .unwrap()
            .with_field(FieldDescriptor::simple("width", "double").unwrap())
            .unwrap();

        let host = MemoryHost::new();
        let schema = build_schema(&host, &description).unwrap();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["created_by", "revision", "width"]);
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_binding_builds_once() {
        let fixture = common::fixture();
        let description = common::metadata_v1();

        let handles: Vec<_> = (0..5)
            .map(|_| fixture.catalog.ensure_bound(&description).unwrap())
            .collect();
        assert!(handles.iter().all(|h| h.guid() == description.guid()));
        assert_eq!(fixture.host.finished_builds(), 1);
    }

    #[test]
    fn test_concurrent_binding_builds_once() {
        let fixture = common::fixture();
        let catalog = Arc::new(fixture.catalog);
        let description = common::metadata_v2();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                let description = description.clone();
                thread::spawn(move || catalog.ensure_bound(&description).unwrap().guid())
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), description.guid());
        }
        assert_eq!(fixture.host.finished_builds(), 1);
    }

    #[test]
    fn test_existing_schema_is_authoritative() {
        let fixture = common::fixture();
        build_schema(fixture.host.as_ref(), &common::metadata_v1()).unwrap();

        // Same GUID, different local fields: the registered schema wins
        let drifted = SchemaDescription::new(common::guid("metadata-v1"), "Metadata")
            .with_field(FieldDescriptor::simple("z", "string").unwrap())
            .unwrap();
        let bound = fixture.catalog.bind(&drifted).unwrap();

        assert_eq!(fixture.host.finished_builds(), 1);
        assert!(bound.schema().get_field("a").is_some());
        assert!(bound.schema().get_field("z").is_none());
    }

    #[test]
    fn test_bound_accessors() {
        let fixture = common::fixture();
        let bound = fixture.catalog.bind(&common::metadata_v1()).unwrap();
        assert_eq!(bound.name(), "Metadata");
        assert_eq!(bound.documentation(), "Project metadata");
        assert_eq!(bound.fields().len(), 3);
        assert!(bound.read_access_granted());
        assert!(bound.write_access_granted());
    }

    #[test]
    fn test_access_is_queried_each_time() {
        let host = Arc::new(MemoryHost::new());
        let catalog = SchemaCatalog::new(host.clone());
        let bound = catalog
            .bind(
                &SchemaDescription::new(Uuid::new_v4(), "Guarded")
                    .with_vendor_id("ACME")
                    .with_write_access(AccessLevel::Vendor),
            )
            .unwrap();

        assert!(!bound.write_access_granted());
        host.set_caller(CallerContext::new().with_vendor_id("ACME"));
        assert!(bound.write_access_granted());
        host.set_caller(CallerContext::new().with_vendor_id("OTHER"));
        assert!(!bound.write_access_granted());
        assert!(bound.read_access_granted());
    }

    #[test]
    fn test_similar_schemas_match_by_name_only() {
        let fixture = common::fixture();
        let v1 = fixture.catalog.ensure_bound(&common::metadata_v1()).unwrap();
        let v2 = fixture.catalog.ensure_bound(&common::metadata_v2()).unwrap();
        fixture
            .catalog
            .ensure_bound(
                &SchemaDescription::new(common::guid("other"), "Other")
                    .with_field(FieldDescriptor::simple("a", "int32").unwrap())
                    .unwrap(),
            )
            .unwrap();

        let similar = list_similar_schemas(fixture.host.as_ref(), &v2);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].guid(), v1.guid());
    }
}

mod loader_tests {
    use super::*;

    #[test]
    fn test_loaded_document_builds() {
        let yaml = r#"
guid: 7a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d
name: Inspection
documentation: Inspection records
fields:
  - name: inspector
    value_type: text
  - name: readings
    container: array
    value_type: double
  - name: notes
    container: map
    key_type: element_id
    value_type: string
    documentation: Notes per element
"#;
        let description = SchemaLoader::from_yaml_str(yaml).unwrap();
        let host = MemoryHost::new();
        let schema = build_schema(&host, &description).unwrap();

        assert_eq!(schema.name(), "Inspection");
        assert_eq!(schema.list_fields()[0].name(), "inspector");
        assert_eq!(
            schema.get_field("notes").unwrap().documentation(),
            "Notes per element"
        );
    }

    #[test]
    fn test_bad_access_level_in_document() {
        let json = r#"{"guid": "7a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d", "name": "X", "read_access": "private"}"#;
        assert!(matches!(
            SchemaLoader::from_json_str(json),
            Err(ExtensibleStorageError::InvalidAccessLevelError { .. })
        ));
    }
}
