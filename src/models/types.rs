//! Type tokens shared by declarations, host schemas and entity values

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ExtensibleStorageError;

/// Value types a field may store
///
/// The set is closed. Only the types for which [`ValueType::is_key_type`]
/// returns true may be used as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int32,
    Int16,
    Byte,
    Double,
    Single,
    Boolean,
    String,
    Guid,
    ElementId,
    Xyz,
    Uv,
    Entity,
}

impl ValueType {
    /// Every allowed value type, in declaration order
    pub const ALL: [ValueType; 12] = [
        ValueType::Int32,
        ValueType::Int16,
        ValueType::Byte,
        ValueType::Double,
        ValueType::Single,
        ValueType::Boolean,
        ValueType::String,
        ValueType::Guid,
        ValueType::ElementId,
        ValueType::Xyz,
        ValueType::Uv,
        ValueType::Entity,
    ];

    /// The snake_case short name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int32 => "int32",
            ValueType::Int16 => "int16",
            ValueType::Byte => "byte",
            ValueType::Double => "double",
            ValueType::Single => "single",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Guid => "guid",
            ValueType::ElementId => "element_id",
            ValueType::Xyz => "xyz",
            ValueType::Uv => "uv",
            ValueType::Entity => "entity",
        }
    }

    /// Whether this type may be used as a map key
    pub fn is_key_type(&self) -> bool {
        !matches!(
            self,
            ValueType::Double
                | ValueType::Single
                | ValueType::Xyz
                | ValueType::Uv
                | ValueType::Entity
        )
    }

    /// Whether fields of this type carry a measurement spec
    pub fn is_measurable(&self) -> bool {
        matches!(
            self,
            ValueType::Double | ValueType::Single | ValueType::Xyz | ValueType::Uv
        )
    }

    /// The type token for a native Rust type
    pub fn of<T: NativeType>() -> Self {
        T::VALUE_TYPE
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native Rust types with a fixed value type token
pub trait NativeType {
    const VALUE_TYPE: ValueType;
}

macro_rules! native_type {
    ($($ty:ty => $token:ident),* $(,)?) => {
        $(impl NativeType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$token;
        })*
    };
}

native_type! {
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
}

/// Container shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    #[default]
    Simple,
    Array,
    Map,
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::Simple => write!(f, "simple"),
            ContainerType::Array => write!(f, "array"),
            ContainerType::Map => write!(f, "map"),
        }
    }
}

impl FromStr for ContainerType {
    type Err = ExtensibleStorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" | "scalar" => Ok(ContainerType::Simple),
            "array" => Ok(ContainerType::Array),
            "map" => Ok(ContainerType::Map),
            other => Err(ExtensibleStorageError::InvalidContainerKindError(
                other.to_string(),
            )),
        }
    }
}

/// Resolved container type token of a field: the shape the host stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Simple(ValueType),
    Array(ValueType),
    Map { key: ValueType, value: ValueType },
}

impl FieldType {
    pub fn container_type(&self) -> ContainerType {
        match self {
            FieldType::Simple(_) => ContainerType::Simple,
            FieldType::Array(_) => ContainerType::Array,
            FieldType::Map { .. } => ContainerType::Map,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            FieldType::Simple(value) | FieldType::Array(value) => *value,
            FieldType::Map { value, .. } => *value,
        }
    }

    pub fn key_type(&self) -> Option<ValueType> {
        match self {
            FieldType::Map { key, .. } => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Simple(value) => write!(f, "{}", value),
            FieldType::Array(value) => write!(f, "IList<{}>", value),
            FieldType::Map { key, value } => write!(f, "IDictionary<{}, {}>", key, value),
        }
    }
}

/// Who may read or write the entities of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Any add-in
    #[default]
    Public,
    /// Only add-ins of the schema's vendor
    Vendor,
    /// Only the application that created the schema
    Application,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => write!(f, "public"),
            AccessLevel::Vendor => write!(f, "vendor"),
            AccessLevel::Application => write!(f, "application"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = ExtensibleStorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(AccessLevel::Public),
            "vendor" => Ok(AccessLevel::Vendor),
            "application" => Ok(AccessLevel::Application),
            _ => Err(ExtensibleStorageError::InvalidAccessLevelError {
                level: s.to_string(),
                reason: "expected one of public, vendor, application".to_string(),
            }),
        }
    }
}

/// Identifier of a measurement spec (length, area, plain number, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecTypeId(Cow<'static, str>);

impl SpecTypeId {
    /// Dimensionless number; the default spec for measurable fields
    pub const NUMBER: SpecTypeId = SpecTypeId(Cow::Borrowed("spec:number"));
    pub const LENGTH: SpecTypeId = SpecTypeId(Cow::Borrowed("spec:length"));
    pub const AREA: SpecTypeId = SpecTypeId(Cow::Borrowed("spec:area"));
    pub const ANGLE: SpecTypeId = SpecTypeId(Cow::Borrowed("spec:angle"));

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a unit; the empty id means "no unit"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeId(Cow<'static, str>);

impl UnitTypeId {
    pub const EMPTY: UnitTypeId = UnitTypeId(Cow::Borrowed(""));
    pub const GENERAL: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:general"));
    pub const METERS: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:meters"));
    pub const MILLIMETERS: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:millimeters"));
    pub const FEET: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:feet"));
    pub const SQUARE_METERS: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:square_meters"));
    pub const DEGREES: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:degrees"));
    pub const RADIANS: UnitTypeId = UnitTypeId(Cow::Borrowed("unit:radians"));

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Identifier of a host element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(i64);

impl ElementId {
    pub const INVALID: ElementId = ElementId(-1);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point or vector in model space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const ZERO: Xyz = Xyz::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A point in a surface parameter space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

impl Uv {
    pub const ZERO: Uv = Uv::new(0.0, 0.0);

    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}
