//! In-memory host schema registry
//!
//! `MemoryHost` implements the host traits entirely in process. Schemas live
//! for the lifetime of the host value; the caller context decides which
//! vendor/application the access checks are answered for.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::{FieldBuilder, SchemaBuilder, SchemaRegistry, StorageError, UnitCatalog};
use crate::models::{
    AccessLevel, ContainerType, Field, Schema, SchemaHandle, SpecTypeId, UnitTypeId, ValueType,
};
use crate::validation::{is_acceptable_name, is_valid_vendor_id};

/// Identity of the add-in currently calling into the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    pub vendor_id: Option<String>,
    pub application_guid: Option<Uuid>,
}

impl CallerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    pub fn with_application_guid(mut self, guid: Uuid) -> Self {
        self.application_guid = Some(guid);
        self
    }
}

/// In-memory schema registry and unit catalog
///
/// # Example
///
/// ```rust
/// use extensible_storage::storage::{MemoryHost, SchemaRegistry};
///
/// let host = MemoryHost::new();
/// assert!(host.list_schemas().is_empty());
/// ```
#[derive(Debug)]
pub struct MemoryHost {
    schemas: RwLock<BTreeMap<Uuid, SchemaHandle>>,
    specs: HashMap<SpecTypeId, Vec<UnitTypeId>>,
    caller: RwLock<CallerContext>,
    builds: AtomicUsize,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Create a host knowing the number, length, area and angle specs
    pub fn new() -> Self {
        let specs = HashMap::from([
            (SpecTypeId::NUMBER, vec![UnitTypeId::GENERAL]),
            (
                SpecTypeId::LENGTH,
                vec![
                    UnitTypeId::FEET,
                    UnitTypeId::METERS,
                    UnitTypeId::MILLIMETERS,
                ],
            ),
            (SpecTypeId::AREA, vec![UnitTypeId::SQUARE_METERS]),
            (
                SpecTypeId::ANGLE,
                vec![UnitTypeId::RADIANS, UnitTypeId::DEGREES],
            ),
        ]);

        Self {
            schemas: RwLock::new(BTreeMap::new()),
            specs,
            caller: RwLock::new(CallerContext::default()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Register an additional measurable spec with its units, preferred first
    pub fn with_measurable_spec(mut self, spec: SpecTypeId, units: Vec<UnitTypeId>) -> Self {
        self.specs.insert(spec, units);
        self
    }

    pub fn with_caller(self, caller: CallerContext) -> Self {
        self.set_caller(caller);
        self
    }

    /// Switch the caller the access checks are answered for
    pub fn set_caller(&self, caller: CallerContext) {
        *self.caller.write().unwrap_or_else(PoisonError::into_inner) = caller;
    }

    pub fn caller(&self) -> CallerContext {
        self.caller
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove a schema from the registry
    ///
    /// Entities of an erased schema become stale. Returns false when no schema
    /// was registered under the GUID.
    pub fn erase_schema(&self, guid: Uuid) -> bool {
        let removed = self
            .schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&guid)
            .is_some();
        if removed {
            info!("Erased schema {}", guid);
        }
        removed
    }

    /// Number of schemas built through this host
    pub fn finished_builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn access_granted(&self, level: AccessLevel, schema: &Schema) -> bool {
        let caller = self.caller.read().unwrap_or_else(PoisonError::into_inner);
        match level {
            AccessLevel::Public => true,
            AccessLevel::Vendor => {
                caller.vendor_id.is_some() && caller.vendor_id.as_deref() == schema.vendor_id()
            }
            AccessLevel::Application => {
                caller.application_guid.is_some()
                    && caller.application_guid == schema.application_guid()
            }
        }
    }

    fn register(&self, schema: Schema) -> Result<SchemaHandle, StorageError> {
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if schemas.contains_key(&schema.guid()) {
            return Err(StorageError::DuplicateSchema(schema.guid()));
        }
        let handle = Arc::new(schema);
        schemas.insert(handle.guid(), handle.clone());
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }
}

impl SchemaRegistry for MemoryHost {
    fn guid_is_valid(&self, guid: Uuid) -> bool {
        !guid.is_nil()
    }

    fn vendor_id_is_valid(&self, vendor_id: &str) -> bool {
        is_valid_vendor_id(vendor_id)
    }

    fn lookup(&self, guid: Uuid) -> Option<SchemaHandle> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guid)
            .cloned()
    }

    fn list_schemas(&self) -> Vec<SchemaHandle> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn schema_builder(&self, guid: Uuid) -> Result<Box<dyn SchemaBuilder + '_>, StorageError> {
        if !self.guid_is_valid(guid) {
            return Err(StorageError::InvalidGuid(guid));
        }
        if self.lookup(guid).is_some() {
            return Err(StorageError::DuplicateSchema(guid));
        }
        Ok(Box::new(MemorySchemaBuilder::new(self, guid)))
    }

    fn read_access_granted(&self, schema: &Schema) -> bool {
        self.access_granted(schema.read_access_level(), schema)
    }

    fn write_access_granted(&self, schema: &Schema) -> bool {
        self.access_granted(schema.write_access_level(), schema)
    }
}

impl UnitCatalog for MemoryHost {
    fn is_measurable_spec(&self, spec: &SpecTypeId) -> bool {
        self.specs.contains_key(spec)
    }

    fn valid_units(&self, spec: &SpecTypeId) -> Vec<UnitTypeId> {
        self.specs.get(spec).cloned().unwrap_or_default()
    }
}

/// Schema under construction in a [`MemoryHost`]
pub struct MemorySchemaBuilder<'h> {
    host: &'h MemoryHost,
    guid: Uuid,
    name: Option<String>,
    documentation: String,
    read_access: AccessLevel,
    write_access: AccessLevel,
    vendor_id: Option<String>,
    application_guid: Option<Uuid>,
    fields: Vec<MemoryFieldBuilder>,
}

impl<'h> MemorySchemaBuilder<'h> {
    fn new(host: &'h MemoryHost, guid: Uuid) -> Self {
        Self {
            host,
            guid,
            name: None,
            documentation: String::new(),
            read_access: AccessLevel::Public,
            write_access: AccessLevel::Public,
            vendor_id: None,
            application_guid: None,
            fields: Vec::new(),
        }
    }

    fn add_field(
        &mut self,
        name: &str,
        container_type: ContainerType,
        key_type: Option<ValueType>,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError> {
        if !is_acceptable_name(name) {
            return Err(StorageError::NameRejected(name.to_string()));
        }
        if self.fields.iter().any(|field| field.name == name) {
            return Err(StorageError::DuplicateField(name.to_string()));
        }
        if let Some(key) = key_type
            && !key.is_key_type()
        {
            return Err(StorageError::InvalidKeyType(key.to_string()));
        }

        self.fields.push(MemoryFieldBuilder {
            name: name.to_string(),
            container_type,
            key_type,
            value_type,
            documentation: String::new(),
            spec: None,
            sub_schema_guid: None,
        });
        let index = self.fields.len() - 1;
        Ok(&mut self.fields[index])
    }

    fn check_complete(&self) -> Result<String, StorageError> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| StorageError::IncompleteSchema(format!("{} has no name", self.guid)))?;

        for level in [self.read_access, self.write_access] {
            match level {
                AccessLevel::Vendor if self.vendor_id.is_none() => {
                    return Err(StorageError::IncompleteSchema(format!(
                        "{} uses vendor access without a vendor id",
                        name
                    )));
                }
                AccessLevel::Application if self.application_guid.is_none() => {
                    return Err(StorageError::IncompleteSchema(format!(
                        "{} uses application access without an application GUID",
                        name
                    )));
                }
                _ => {}
            }
        }

        for field in &self.fields {
            if field.needs_units() {
                match &field.spec {
                    None => {
                        return Err(StorageError::IncompleteSchema(format!(
                            "field '{}' requires a spec",
                            field.name
                        )));
                    }
                    Some(spec) if !self.host.is_measurable_spec(spec) => {
                        return Err(StorageError::IncompleteSchema(format!(
                            "field '{}' uses unknown spec {}",
                            field.name, spec
                        )));
                    }
                    Some(_) => {}
                }
            }
            if field.needs_sub_schema_guid() && field.sub_schema_guid.is_none() {
                return Err(StorageError::IncompleteSchema(format!(
                    "field '{}' requires a sub-schema GUID",
                    field.name
                )));
            }
        }
        Ok(name)
    }
}

impl SchemaBuilder for MemorySchemaBuilder<'_> {
    fn acceptable_name(&self, name: &str) -> bool {
        is_acceptable_name(name)
    }

    fn set_schema_name(&mut self, name: &str) -> Result<(), StorageError> {
        if !is_acceptable_name(name) {
            return Err(StorageError::NameRejected(name.to_string()));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    fn set_documentation(&mut self, documentation: &str) {
        self.documentation = documentation.to_string();
    }

    fn set_read_access_level(&mut self, level: AccessLevel) {
        self.read_access = level;
    }

    fn set_write_access_level(&mut self, level: AccessLevel) {
        self.write_access = level;
    }

    fn set_vendor_id(&mut self, vendor_id: &str) -> Result<(), StorageError> {
        if !is_valid_vendor_id(vendor_id) {
            return Err(StorageError::NameRejected(vendor_id.to_string()));
        }
        self.vendor_id = Some(vendor_id.to_string());
        Ok(())
    }

    fn set_application_guid(&mut self, guid: Uuid) -> Result<(), StorageError> {
        if guid.is_nil() {
            return Err(StorageError::InvalidGuid(guid));
        }
        self.application_guid = Some(guid);
        Ok(())
    }

    fn add_simple_field(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError> {
        self.add_field(name, ContainerType::Simple, None, value_type)
    }

    fn add_array_field(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError> {
        self.add_field(name, ContainerType::Array, None, value_type)
    }

    fn add_map_field(
        &mut self,
        name: &str,
        key_type: ValueType,
        value_type: ValueType,
    ) -> Result<&mut dyn FieldBuilder, StorageError> {
        self.add_field(name, ContainerType::Map, Some(key_type), value_type)
    }

    fn finish(self: Box<Self>) -> Result<SchemaHandle, StorageError> {
        let name = self.check_complete()?;
        let host = self.host;
        let guid = self.guid;

        let fields = self
            .fields
            .into_iter()
            .map(|builder| builder.into_field(guid, host))
            .collect();

        let schema = Schema::new(
            guid,
            name,
            self.documentation,
            self.vendor_id,
            self.application_guid,
            self.read_access,
            self.write_access,
            fields,
        );
        let handle = host.register(schema)?;
        debug!("Registered schema {} ({})", handle.name(), handle.guid());
        Ok(handle)
    }
}

/// Field under construction in a [`MemorySchemaBuilder`]
pub struct MemoryFieldBuilder {
    name: String,
    container_type: ContainerType,
    key_type: Option<ValueType>,
    value_type: ValueType,
    documentation: String,
    spec: Option<SpecTypeId>,
    sub_schema_guid: Option<Uuid>,
}

impl MemoryFieldBuilder {
    fn into_field(self, schema_guid: Uuid, catalog: &MemoryHost) -> Field {
        let mut field = Field::new(schema_guid, self.name, self.container_type, self.value_type)
            .with_documentation(self.documentation);
        if let Some(key) = self.key_type {
            field = field.with_key_type(key);
        }
        if let Some(spec) = self.spec {
            let units = catalog.valid_units(&spec);
            field = field.with_spec(spec, units);
        }
        if let Some(guid) = self.sub_schema_guid {
            field = field.with_sub_schema_guid(guid);
        }
        field
    }
}

impl FieldBuilder for MemoryFieldBuilder {
    fn set_documentation(&mut self, documentation: &str) {
        self.documentation = documentation.to_string();
    }

    fn needs_units(&self) -> bool {
        self.value_type.is_measurable()
    }

    fn set_spec(&mut self, spec: &SpecTypeId) -> Result<(), StorageError> {
        if !self.needs_units() {
            return Err(StorageError::UnitsNotApplicable(self.name.clone()));
        }
        self.spec = Some(spec.clone());
        Ok(())
    }

    fn needs_sub_schema_guid(&self) -> bool {
        self.value_type == ValueType::Entity
    }

    fn set_sub_schema_guid(&mut self, guid: Uuid) -> Result<(), StorageError> {
        if guid.is_nil() {
            return Err(StorageError::InvalidGuid(guid));
        }
        self.sub_schema_guid = Some(guid);
        Ok(())
    }
}
