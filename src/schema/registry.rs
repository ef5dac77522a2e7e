//! Schema registry binding
//!
//! Binds schema descriptions to host schemas, building each one at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

use super::builder::build_schema;
use crate::config::ScopeConfig;
use crate::entity::{Entity, EntityScope};
use crate::error::Result;
use crate::models::{Field, Schema, SchemaDescription, SchemaHandle};
use crate::storage::{Element, Host, SchemaRegistry};

/// Memoized build-or-lookup of schema descriptions
///
/// The first call for a GUID looks the schema up in the host registry and
/// only builds it when it is missing. A schema already registered under the
/// GUID is used as-is even if its fields differ from the description.
/// Later calls return the cached handle.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use extensible_storage::models::{FieldDescriptor, SchemaDescription};
/// use extensible_storage::schema::SchemaCatalog;
/// use extensible_storage::storage::MemoryHost;
///
/// let host = Arc::new(MemoryHost::new());
/// let catalog = SchemaCatalog::new(host.clone());
/// let description = SchemaDescription::parse("9a1d7e52-3f44-4c1b-b0a8-5e2f6d7c8b90", "Tags")
///     .unwrap()
///     .with_field(FieldDescriptor::array("labels", "string").unwrap())
///     .unwrap();
///
/// let first = catalog.ensure_bound(&description).unwrap();
/// let second = catalog.ensure_bound(&description).unwrap();
/// assert_eq!(first.guid(), second.guid());
/// assert_eq!(host.finished_builds(), 1);
/// ```
pub struct SchemaCatalog {
    host: Arc<dyn Host>,
    bound: Mutex<HashMap<Uuid, SchemaHandle>>,
}

impl SchemaCatalog {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            bound: Mutex::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Get the host schema for a description, building it if needed
    pub fn ensure_bound(&self, description: &SchemaDescription) -> Result<SchemaHandle> {
        let guid = description.guid();
        let mut bound = self.bound.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = bound.get(&guid) {
            return Ok(handle.clone());
        }

        let handle = match self.host.lookup(guid) {
            Some(existing) => {
                info!("Bound schema '{}' to registered {}", existing.name(), guid);
                existing
            }
            None => build_schema(self.host.as_ref(), description)?,
        };
        bound.insert(guid, handle.clone());
        Ok(handle)
    }

    /// Bind a description and wrap the handle for entity access
    pub fn bind(&self, description: &SchemaDescription) -> Result<BoundSchema> {
        let schema = self.ensure_bound(description)?;
        Ok(BoundSchema::new(self.host.clone(), schema))
    }
}

/// A host schema together with the host it belongs to
#[derive(Clone)]
pub struct BoundSchema {
    host: Arc<dyn Host>,
    schema: SchemaHandle,
}

impl BoundSchema {
    pub fn new(host: Arc<dyn Host>, schema: SchemaHandle) -> Self {
        Self { host, schema }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }

    pub fn guid(&self) -> Uuid {
        self.schema.guid()
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn fields(&self) -> &[Field] {
        self.schema.fields()
    }

    pub fn documentation(&self) -> &str {
        self.schema.documentation()
    }

    /// Asks the host on every call; the caller context may have changed
    pub fn read_access_granted(&self) -> bool {
        self.host.read_access_granted(&self.schema)
    }

    /// Asks the host on every call; the caller context may have changed
    pub fn write_access_granted(&self) -> bool {
        self.host.write_access_granted(&self.schema)
    }

    /// Other versions of this schema: same name, different GUID
    pub fn similar_schemas(&self) -> Vec<SchemaHandle> {
        list_similar_schemas(self.host.as_ref(), &self.schema)
    }

    /// A new, detached entity of this schema with every field at its default
    pub fn new_entity(&self) -> Entity {
        Entity::new(self.host.clone(), self.schema.clone())
    }

    /// Open the entity of this schema on an element for update
    ///
    /// See [`EntityScope`] for the migration and commit behaviour.
    pub fn open<'e, E: Element + ?Sized>(
        &self,
        element: &'e E,
        config: &ScopeConfig,
    ) -> Result<EntityScope<'e, E>> {
        EntityScope::open(self, element, config)
    }
}

impl std::fmt::Debug for BoundSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundSchema")
            .field("guid", &self.schema.guid())
            .field("name", &self.schema.name())
            .finish()
    }
}

/// Find the registered schemas sharing a schema's name but not its GUID
pub fn list_similar_schemas<R: SchemaRegistry + ?Sized>(
    registry: &R,
    schema: &Schema,
) -> Vec<SchemaHandle> {
    let similar: Vec<SchemaHandle> = registry
        .list_schemas()
        .into_iter()
        .filter(|other| other.name() == schema.name() && other.guid() != schema.guid())
        .collect();
    debug!(
        "Found {} other versions of schema '{}'",
        similar.len(),
        schema.name()
    );
    similar
}
