//! Schema version migration tests

use extensible_storage::entity::{transfer_field_data, update_schema_entities, with_entity};
use extensible_storage::models::{FieldDescriptor, SchemaDescription, Value};
use extensible_storage::storage::{Element, StorageError};
use extensible_storage::{ExtensibleStorageError, ScopeConfig};

mod common;

fn store_v1(fixture: &common::Fixture, element: &impl Element) {
    let v1 = fixture.catalog.bind(&common::metadata_v1()).unwrap();
    with_entity(&v1, element, &ScopeConfig::default(), |entity| {
        entity.set("a", 7)?;
        entity.set("b", "seven")?;
        entity.set("c", 7.5f64)
    })
    .unwrap();
}

mod field_matching_tests {
    use super::*;

    #[test]
    fn test_copies_name_and_type_matches_only() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Wall");
        store_v1(&fixture, &element);

        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();
        let scope = v2.open(&element, &ScopeConfig::default()).unwrap();

        assert_eq!(scope.get("a").unwrap(), Value::Int32(7));
        assert_eq!(scope.get("b").unwrap(), Value::Int32(0));
        assert_eq!(scope.get("d").unwrap(), Value::Double(0.0));

        let report = &scope.migrations()[0];
        assert_eq!(report.old_schema_guid, common::guid("metadata-v1"));
        assert_eq!(report.copied, vec!["a".to_string()]);
        assert_eq!(report.skipped, vec!["b".to_string(), "d".to_string()]);
        assert!(report.removed);
    }

    #[test]
    fn test_transfer_between_detached_entities() {
        let fixture = common::fixture();
        let v1 = fixture.catalog.bind(&common::metadata_v1()).unwrap();
        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();

        let mut old = v1.new_entity();
        old.set("a", 11).unwrap();
        let mut new = v2.new_entity();
        new.set("a", 99).unwrap();
        new.set("b", 5).unwrap();

        let report = transfer_field_data(&old, &mut new).unwrap();
        assert_eq!(report.copied, vec!["a".to_string()]);
        assert_eq!(new.get("a").unwrap(), Value::Int32(11));
        assert_eq!(new.get("b").unwrap(), Value::Int32(5));
    }

    #[test]
    fn test_unset_old_field_copies_default() {
        let fixture = common::fixture();
        let v1 = fixture.catalog.bind(&common::metadata_v1()).unwrap();
        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();

        let old = v1.new_entity();
        let mut new = v2.new_entity();
        new.set("a", 99).unwrap();

        transfer_field_data(&old, &mut new).unwrap();
        assert_eq!(new.get("a").unwrap(), Value::Int32(0));
    }

    #[test]
    fn test_container_change_is_skipped() {
        let fixture = common::fixture();
        let old_description = SchemaDescription::new(common::guid("list-v1"), "Lists")
            .with_field(FieldDescriptor::simple("items", "string").unwrap())
            .unwrap();
        let new_description = SchemaDescription::new(common::guid("list-v2"), "Lists")
            .with_field(FieldDescriptor::array("items", "string").unwrap())
            .unwrap();
        let old_schema = fixture.catalog.bind(&old_description).unwrap();
        let new_schema = fixture.catalog.bind(&new_description).unwrap();

        let mut old = old_schema.new_entity();
        old.set("items", "only").unwrap();
        let mut new = new_schema.new_entity();

        let report = transfer_field_data(&old, &mut new).unwrap();
        assert!(report.copied.is_empty());
        assert_eq!(report.skipped, vec!["items".to_string()]);
    }
}

mod candidate_tests {
    use super::*;

    #[test]
    fn test_other_names_never_migrate() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Wall");
        store_v1(&fixture, &element);

        let other = fixture
            .catalog
            .bind(
                &SchemaDescription::new(common::guid("other"), "Other")
                    .with_field(FieldDescriptor::simple("a", "int32").unwrap())
                    .unwrap(),
            )
            .unwrap();
        with_entity(&other, &element, &ScopeConfig::default(), |entity| {
            entity.set("a", 1000)
        })
        .unwrap();

        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();
        let scope = v2.open(&element, &ScopeConfig::default()).unwrap();

        assert_eq!(scope.migrations().len(), 1);
        assert_eq!(scope.get("a").unwrap(), Value::Int32(7));
        assert!(element.schema_guids().contains(&other.guid()));
    }

    #[test]
    fn test_old_entity_kept_when_removal_disabled() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Wall");
        store_v1(&fixture, &element);

        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();
        let config = ScopeConfig::new().with_remove_old_entities(false);
        let scope = v2.open(&element, &config).unwrap();

        assert!(!scope.migrations()[0].removed);
        assert!(element.schema_guids().contains(&common::guid("metadata-v1")));
    }

    #[test]
    fn test_removal_is_its_own_transaction() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Wall");
        store_v1(&fixture, &element);

        let v2 = fixture.catalog.bind(&common::metadata_v2()).unwrap();
        let scope = v2.open(&element, &ScopeConfig::default()).unwrap();
        assert!(!element.schema_guids().contains(&common::guid("metadata-v1")));

        // The new entity is only stored on commit
        assert!(!element.schema_guids().contains(&v2.guid()));
        scope.commit().unwrap();
        assert_eq!(element.schema_guids(), vec![v2.guid()]);
        assert_eq!(
            fixture.document.transaction_log(),
            vec![
                "Update Entity: Wall % Metadata".to_string(),
                "Delete Entity: Wall % Metadata".to_string(),
                "Update Entity: Wall % Metadata".to_string(),
            ]
        );
    }
}

mod deletion_gating_tests {
    use super::*;

    fn assembly(version: &str, part: &str) -> SchemaDescription {
        SchemaDescription::new(common::guid(&format!("assembly-{version}")), "Assembly")
            .with_field(FieldDescriptor::simple("count", "int32").unwrap())
            .unwrap()
            .with_field(
                FieldDescriptor::simple("part", "entity")
                    .unwrap()
                    .with_sub_schema(common::guid(part)),
            )
            .unwrap()
    }

    fn part(name: &str) -> SchemaDescription {
        SchemaDescription::new(common::guid(name), name)
            .with_field(FieldDescriptor::simple("label", "string").unwrap())
            .unwrap()
    }

    #[test]
    fn test_failed_copy_keeps_old_entity() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Frame");
        let part_a = fixture.catalog.bind(&part("PartA")).unwrap();
        fixture.catalog.bind(&part("PartB")).unwrap();

        let v1 = fixture.catalog.bind(&assembly("v1", "PartA")).unwrap();
        with_entity(&v1, &element, &ScopeConfig::default(), |entity| {
            entity.set("count", 3)?;
            entity.set("part", part_a.new_entity())
        })
        .unwrap();

        // Same name and type token, but the nested schema differs
        let v2 = fixture.catalog.bind(&assembly("v2", "PartB")).unwrap();
        let result = v2.open(&element, &ScopeConfig::default());
        assert!(matches!(
            result,
            Err(ExtensibleStorageError::StorageError(
                StorageError::SubSchemaMismatch { .. }
            ))
        ));

        assert!(element.schema_guids().contains(&v1.guid()));
        assert!(
            !fixture
                .document
                .transaction_log()
                .iter()
                .any(|name| name.starts_with("Delete Entity"))
        );
    }

    #[test]
    fn test_failed_copy_leaves_target_untouched() {
        let fixture = common::fixture();
        let element = fixture.document.create_element("Frame");
        let part_a = fixture.catalog.bind(&part("PartA")).unwrap();
        fixture.catalog.bind(&part("PartB")).unwrap();

        let v1 = fixture.catalog.bind(&assembly("v1", "PartA")).unwrap();
        with_entity(&v1, &element, &ScopeConfig::default(), |entity| {
            entity.set("count", 3)?;
            entity.set("part", part_a.new_entity())
        })
        .unwrap();

        let v2 = fixture.catalog.bind(&assembly("v2", "PartB")).unwrap();
        let mut entity = v2.new_entity();
        entity.set("count", 42).unwrap();

        assert!(update_schema_entities(&element, &mut entity, true).is_err());
        assert_eq!(entity.get("count").unwrap(), Value::Int32(42));
        assert!(element.schema_guids().contains(&v1.guid()));
    }
}
