//! Migration of entity data between schema versions
//!
//! Versions of a schema share a name and differ in GUID. When an entity of
//! the current version is opened on an element, fields of older-version
//! entities on the same element are copied over when they are compatible:
//! same name, same container type token, and the new field accepts the unit
//! the old one is read in. Everything else is skipped.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Entity;
use crate::error::Result;
use crate::schema::list_similar_schemas;
use crate::storage::{Element, run_in_transaction};
use crate::validation::determine_field_type;

/// What happened to one old-version entity during migration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub old_schema_guid: Uuid,
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
    pub removed: bool,
}

/// Copy every compatible field of `old` into `new`
///
/// Fields unset on `old` are reset to their default on `new`. The first copy
/// error aborts the transfer; `new` may then be partially updated.
pub fn transfer_field_data(old: &Entity, new: &mut Entity) -> Result<MigrationReport> {
    let mut report = MigrationReport {
        old_schema_guid: old.schema_guid(),
        ..MigrationReport::default()
    };
    let old_schema = old.schema().clone();
    let new_schema = new.schema().clone();

    for new_field in new_schema.fields() {
        let name = new_field.name();
        let Some(old_field) = old_schema.get_field(name) else {
            debug!("Migration: '{}' has no counterpart in {}", name, old_schema.guid());
            report.skipped.push(name.to_string());
            continue;
        };

        if determine_field_type(old_field)? != determine_field_type(new_field)? {
            debug!("Migration: '{}' changed type, skipped", name);
            report.skipped.push(name.to_string());
            continue;
        }

        let unit = old.host().default_unit(old_field);
        if !new_field.compatible_unit(&unit) {
            debug!("Migration: '{}' cannot take unit {}, skipped", name, unit);
            report.skipped.push(name.to_string());
            continue;
        }

        if old.raw().contains(old_field.name()) {
            let value = old.raw().get(old_field, &unit)?;
            new.raw_mut().set(new_field, value, &unit)?;
        } else {
            new.raw_mut().clear(new_field)?;
        }
        report.copied.push(name.to_string());
    }

    Ok(report)
}

/// Migrate the element's old-version entities into `entity`
///
/// Each old version is copied into a scratch clone first, so a failed copy
/// leaves `entity` untouched and the old entity in place. With
/// `remove_old` set, an old entity is deleted in its own transaction once
/// all of its fields have been copied.
pub fn update_schema_entities<E: Element + ?Sized>(
    element: &E,
    entity: &mut Entity,
    remove_old: bool,
) -> Result<Vec<MigrationReport>> {
    let host = entity.host().clone();
    let mut reports = Vec::new();

    for old_schema in list_similar_schemas(host.as_ref(), entity.schema()) {
        if !host.read_access_granted(&old_schema) {
            warn!(
                "Skipping migration from {}: read access not granted",
                old_schema.guid()
            );
            continue;
        }
        let Some(raw) = element.get_entity(&old_schema)? else {
            continue;
        };

        let old = Entity::from_raw(host.clone(), old_schema.clone(), raw);
        if !old.is_valid() {
            warn!(
                "Skipping invalid entity of {} on element {}",
                old_schema.guid(),
                element.id()
            );
            continue;
        }

        let mut scratch = entity.clone();
        let mut report = transfer_field_data(&old, &mut scratch)?;
        *entity = scratch;

        if remove_old {
            let name = format!("Delete Entity: {} % {}", element.name(), old_schema.name());
            run_in_transaction(element, &name, |transaction| {
                Ok(element.delete_entity(transaction, &old_schema)?)
            })?;
            report.removed = true;
            info!(
                "Removed entity of {} from element {} after migration",
                old_schema.guid(),
                element.id()
            );
        }

        info!(
            "Migrated {} fields from {} to {}",
            report.copied.len(),
            old_schema.guid(),
            entity.schema_guid()
        );
        reports.push(report);
    }

    Ok(reports)
}
