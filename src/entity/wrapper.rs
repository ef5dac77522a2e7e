//! Typed entity wrapper

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::convert::{convert_to_generic, reshape};
use crate::error::{ExtensibleStorageError, Result};
use crate::models::{
    ElementId, Field, FieldRef, MapKey, NativeType, SchemaHandle, UnitTypeId, Uv, Value,
    ValueType, Xyz,
};
use crate::storage::{Host, RawEntity};
use crate::validation::resolve_field;

/// A detached entity bound to a host schema
///
/// Changes only affect this value until it is stored on an element, see
/// [`crate::entity::EntityScope`]. Fields are addressed by name or by handle:
///
/// ```rust
/// use std::sync::Arc;
/// use extensible_storage::models::{FieldDescriptor, SchemaDescription, Value};
/// use extensible_storage::schema::SchemaCatalog;
/// use extensible_storage::storage::MemoryHost;
///
/// let catalog = SchemaCatalog::new(Arc::new(MemoryHost::new()));
/// let counters = catalog
///     .bind(
///         &SchemaDescription::parse("5c3e2a10-8d4f-4b6e-a1c2-7d8e9f0a1b2c", "Counters")
///             .unwrap()
///             .with_field(FieldDescriptor::simple("hits", "int32").unwrap())
///             .unwrap(),
///     )
///     .unwrap();
///
/// let mut entity = counters.new_entity();
/// entity.set("hits", 3).unwrap();
/// assert_eq!(entity.get_as::<i32>("hits").unwrap(), 3);
/// ```
#[derive(Clone)]
pub struct Entity {
    raw: RawEntity,
    schema: SchemaHandle,
    host: Arc<dyn Host>,
}

impl Entity {
    /// A new entity of the schema with every field at its default
    pub fn new(host: Arc<dyn Host>, schema: SchemaHandle) -> Self {
        Self {
            raw: RawEntity::new(schema.guid()),
            schema,
            host,
        }
    }

    /// Wrap an entity retrieved from the host
    pub fn from_raw(host: Arc<dyn Host>, schema: SchemaHandle, raw: RawEntity) -> Self {
        Self { raw, schema, host }
    }

    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }

    pub fn schema_guid(&self) -> Uuid {
        self.raw.schema_guid()
    }

    /// An entity is valid while it has a schema that is still registered
    pub fn is_valid(&self) -> bool {
        self.raw.has_schema() && self.host.lookup(self.raw.schema_guid()).is_some()
    }

    pub fn read_access_granted(&self) -> bool {
        self.host.read_access_granted(&self.schema)
    }

    pub fn write_access_granted(&self) -> bool {
        self.host.write_access_granted(&self.schema)
    }

    /// Whether the field belongs to this entity's schema
    pub fn recognized_field<'f>(&self, field: impl Into<FieldRef<'f>>) -> bool {
        resolve_field(&self.schema, field.into()).is_ok()
    }

    /// The unit used by `get` and `set` for a field
    pub fn default_unit<'f>(&self, field: impl Into<FieldRef<'f>>) -> Result<UnitTypeId> {
        let field = resolve_field(&self.schema, field.into())?;
        Ok(self.host.default_unit(field))
    }

    pub fn get<'f>(&self, field: impl Into<FieldRef<'f>>) -> Result<Value> {
        self.ensure_valid()?;
        let field = resolve_field(&self.schema, field.into())?;
        let unit = self.host.default_unit(field);
        self.read(field, &unit)
    }

    pub fn get_with_unit<'f>(
        &self,
        field: impl Into<FieldRef<'f>>,
        unit: &UnitTypeId,
    ) -> Result<Value> {
        self.ensure_valid()?;
        let field = resolve_field(&self.schema, field.into())?;
        self.read(field, unit)
    }

    /// Get a field as a native type
    ///
    /// Fails with `FieldTypeMismatchError` when the field's shape or type
    /// does not match `T`.
    pub fn get_as<'f, T: FromValue>(&self, field: impl Into<FieldRef<'f>>) -> Result<T> {
        let field = field.into();
        let name = match field {
            FieldRef::Name(name) => name.to_string(),
            FieldRef::Field(field) => field.name().to_string(),
        };
        let value = self.get(field)?;
        let actual = value.describe();
        T::from_value(value).ok_or_else(|| ExtensibleStorageError::FieldTypeMismatchError {
            field: name,
            expected: T::describe(),
            actual,
        })
    }

    pub fn set<'f>(&mut self, field: impl Into<FieldRef<'f>>, value: impl Into<Value>) -> Result<()> {
        self.ensure_valid()?;
        let schema = self.schema.clone();
        let field = resolve_field(&schema, field.into())?;
        let unit = self.host.default_unit(field);
        self.write(field, value.into(), &unit)
    }

    pub fn set_with_unit<'f>(
        &mut self,
        field: impl Into<FieldRef<'f>>,
        value: impl Into<Value>,
        unit: &UnitTypeId,
    ) -> Result<()> {
        self.ensure_valid()?;
        let schema = self.schema.clone();
        let field = resolve_field(&schema, field.into())?;
        self.write(field, value.into(), unit)
    }

    /// Reset a field to its default: zero, empty or invalid
    pub fn clear<'f>(&mut self, field: impl Into<FieldRef<'f>>) -> Result<()> {
        self.ensure_valid()?;
        let schema = self.schema.clone();
        let field = resolve_field(&schema, field.into())?;
        self.raw.clear(field)?;
        debug!("Cleared '{}' on {}", field.name(), schema.name());
        Ok(())
    }

    pub fn raw(&self) -> &RawEntity {
        &self.raw
    }

    pub fn into_raw(self) -> RawEntity {
        self.raw
    }

    pub(crate) fn raw_mut(&mut self) -> &mut RawEntity {
        &mut self.raw
    }

    pub(crate) fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ExtensibleStorageError::StaleEntityError(
                self.raw.schema_guid(),
            ))
        }
    }

    fn read(&self, field: &Field, unit: &UnitTypeId) -> Result<Value> {
        let raw = self.raw.get(field, unit)?;
        debug!("Get '{}' on {} ({})", field.name(), self.schema.name(), unit);
        reshape(&self.host, field, raw)
    }

    fn write(&mut self, field: &Field, value: Value, unit: &UnitTypeId) -> Result<()> {
        let raw = convert_to_generic(field, value)?;
        self.raw.set(field, raw, unit)?;
        debug!("Set '{}' on {} ({})", field.name(), self.schema.name(), unit);
        Ok(())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("schema", &self.schema.name())
            .field("raw", &self.raw)
            .finish()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl NativeType for Entity {
    const VALUE_TYPE: ValueType = ValueType::Entity;
}

/// Conversion from a semantic value into a native type
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;

    /// Name of the expected shape, used in error messages
    fn describe() -> String;
}

macro_rules! scalar_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl FromValue for $ty {
            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn describe() -> String {
                ValueType::$variant.to_string()
            }
        })*
    };
}

scalar_from_value! {
    i32 => Int32,
    i16 => Int16,
    u8 => Byte,
    f64 => Double,
    f32 => Single,
    bool => Boolean,
    String => String,
    Uuid => Guid,
    ElementId => ElementId,
    Xyz => Xyz,
    Uv => Uv,
    Entity => Entity,
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn describe() -> String {
        format!("IList<{}>", T::describe())
    }
}

impl<V: FromValue> FromValue for BTreeMap<MapKey, V> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| V::from_value(value).map(|value| (key, value)))
                .collect(),
            _ => None,
        }
    }

    fn describe() -> String {
        format!("IDictionary<?, {}>", V::describe())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }

    fn describe() -> String {
        "any".to_string()
    }
}
