//! Scoped entity updates
//!
//! An [`EntityScope`] loads (and optionally migrates) the entity of a schema
//! on an element, hands it out for modification and stores it back in a
//! single transaction on `commit`. Dropping the scope, or `abort`, discards
//! the changes.

use std::ops::{Deref, DerefMut};
use tracing::info;

use super::migration::{MigrationReport, update_schema_entities};
use super::Entity;
use crate::config::ScopeConfig;
use crate::error::Result;
use crate::schema::BoundSchema;
use crate::storage::{Element, run_in_transaction};

/// An entity opened for update on an element
pub struct EntityScope<'e, E: Element + ?Sized> {
    element: &'e E,
    entity: Entity,
    migrations: Vec<MigrationReport>,
}

impl<'e, E: Element + ?Sized> EntityScope<'e, E> {
    /// Load the element's entity of the schema, or start a new one
    ///
    /// With `migrate_on_open`, compatible fields of older schema versions on
    /// the element are copied in before the scope is returned.
    pub fn open(schema: &BoundSchema, element: &'e E, config: &ScopeConfig) -> Result<Self> {
        let mut entity = match element.get_entity(schema.schema())? {
            Some(raw) => Entity::from_raw(schema.host().clone(), schema.schema().clone(), raw),
            None => schema.new_entity(),
        };

        let migrations = if config.migrate_on_open {
            update_schema_entities(element, &mut entity, config.remove_old_entities)?
        } else {
            Vec::new()
        };

        Ok(Self {
            element,
            entity,
            migrations,
        })
    }

    pub fn element(&self) -> &E {
        self.element
    }

    /// Reports of the migrations that ran when the scope was opened
    pub fn migrations(&self) -> &[MigrationReport] {
        &self.migrations
    }

    /// Store the entity on the element and return it
    pub fn commit(self) -> Result<Entity> {
        let name = format!(
            "Update Entity: {} % {}",
            self.element.name(),
            self.entity.schema().name()
        );
        run_in_transaction(self.element, &name, |transaction| {
            Ok(self.element.set_entity(transaction, self.entity.raw())?)
        })?;
        info!(
            "Committed entity of {} on element {}",
            self.entity.schema().name(),
            self.element.id()
        );
        Ok(self.entity)
    }

    /// Discard the changes made in this scope
    pub fn abort(self) {}
}

impl<E: Element + ?Sized> Deref for EntityScope<'_, E> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

impl<E: Element + ?Sized> DerefMut for EntityScope<'_, E> {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// Run `f` on the schema's entity of an element and store it on success
///
/// When `f` fails nothing is written and the error is returned.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use extensible_storage::config::ScopeConfig;
/// use extensible_storage::entity::with_entity;
/// use extensible_storage::models::{FieldDescriptor, SchemaDescription};
/// use extensible_storage::schema::SchemaCatalog;
/// use extensible_storage::storage::{MemoryDocument, MemoryHost};
///
/// let host = Arc::new(MemoryHost::new());
/// let document = MemoryDocument::new(host.clone());
/// let catalog = SchemaCatalog::new(host);
/// let notes = catalog
///     .bind(
///         &SchemaDescription::parse("3e8a9b7c-1d2e-4f30-8a4b-5c6d7e8f9a0b", "Notes")
///             .unwrap()
///             .with_field(FieldDescriptor::simple("text", "string").unwrap())
///             .unwrap(),
///     )
///     .unwrap();
///
/// let wall = document.create_element("Wall");
/// with_entity(&notes, &wall, &ScopeConfig::default(), |entity| {
///     entity.set("text", "load bearing")
/// })
/// .unwrap();
/// ```
pub fn with_entity<E, T, F>(
    schema: &BoundSchema,
    element: &E,
    config: &ScopeConfig,
    f: F,
) -> Result<T>
where
    E: Element + ?Sized,
    F: FnOnce(&mut Entity) -> Result<T>,
{
    let mut scope = EntityScope::open(schema, element, config)?;
    let value = f(&mut *scope)?;
    scope.commit()?;
    Ok(value)
}
