//! Semantic field values exchanged with application code

use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::types::{ElementId, Uv, ValueType, Xyz};
use crate::entity::Entity;

/// A map key: one of the key-capable value types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Int32(i32),
    Int16(i16),
    Byte(u8),
    Boolean(bool),
    String(String),
    Guid(Uuid),
    ElementId(ElementId),
}

impl MapKey {
    pub fn value_type(&self) -> ValueType {
        match self {
            MapKey::Int32(_) => ValueType::Int32,
            MapKey::Int16(_) => ValueType::Int16,
            MapKey::Byte(_) => ValueType::Byte,
            MapKey::Boolean(_) => ValueType::Boolean,
            MapKey::String(_) => ValueType::String,
            MapKey::Guid(_) => ValueType::Guid,
            MapKey::ElementId(_) => ValueType::ElementId,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int32(v) => write!(f, "{}", v),
            MapKey::Int16(v) => write!(f, "{}", v),
            MapKey::Byte(v) => write!(f, "{}", v),
            MapKey::Boolean(v) => write!(f, "{}", v),
            MapKey::String(v) => write!(f, "{}", v),
            MapKey::Guid(v) => write!(f, "{}", v),
            MapKey::ElementId(v) => write!(f, "{}", v),
        }
    }
}

/// A field value as seen by application code
///
/// Arrays and maps are plain Rust containers here. They are checked for
/// homogeneity and converted to the host's typed containers on `set`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int16(i16),
    Byte(u8),
    Double(f64),
    Single(f32),
    Boolean(bool),
    String(String),
    Guid(Uuid),
    ElementId(ElementId),
    Xyz(Xyz),
    Uv(Uv),
    Entity(Entity),
    Array(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
}

impl Value {
    /// The value type of a scalar; `None` for arrays and maps
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Int32(_) => ValueType::Int32,
            Value::Int16(_) => ValueType::Int16,
            Value::Byte(_) => ValueType::Byte,
            Value::Double(_) => ValueType::Double,
            Value::Single(_) => ValueType::Single,
            Value::Boolean(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Guid(_) => ValueType::Guid,
            Value::ElementId(_) => ValueType::ElementId,
            Value::Xyz(_) => ValueType::Xyz,
            Value::Uv(_) => ValueType::Uv,
            Value::Entity(_) => ValueType::Entity,
            Value::Array(_) | Value::Map(_) => return None,
        })
    }

    /// Short description of the value's shape, used in error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Array(items) => match items.first().and_then(Value::value_type) {
                Some(value_type) => format!("IList<{}>", value_type),
                None => "IList<?>".to_string(),
            },
            Value::Map(entries) => match entries.iter().next() {
                Some((key, value)) => match value.value_type() {
                    Some(value_type) => {
                        format!("IDictionary<{}, {}>", key.value_type(), value_type)
                    }
                    None => format!("IDictionary<{}, ?>", key.value_type()),
                },
                None => "IDictionary<?, ?>".to_string(),
            },
            scalar => scalar
                .value_type()
                .map(|value_type| value_type.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Int32(v) => Value::Int32(v),
            MapKey::Int16(v) => Value::Int16(v),
            MapKey::Byte(v) => Value::Byte(v),
            MapKey::Boolean(v) => Value::Boolean(v),
            MapKey::String(v) => Value::String(v),
            MapKey::Guid(v) => Value::Guid(v),
            MapKey::ElementId(v) => Value::ElementId(v),
        }
    }
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

scalar_conversions! {
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

macro_rules! key_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for MapKey {
            fn from(v: $ty) -> Self {
                MapKey::$variant(v)
            }
        })*
    };
}

key_conversions! {
    i32 => Int32,
    i16 => Int16,
    u8 => Byte,
    bool => Boolean,
    String => String,
    Uuid => Guid,
    ElementId => ElementId,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<MapKey>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
