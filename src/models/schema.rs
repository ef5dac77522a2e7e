//! Schema declarations and host schema handles

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::field::{Field, FieldDescriptor};
use super::types::AccessLevel;
use crate::error::{ExtensibleStorageError, Result};

/// A named, reusable list of field declarations
///
/// Tables are included into a [`SchemaDescription`] to share fields between
/// schemas. Inclusion flattens them in order; see [`SchemaDescription::include`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldTable {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl FieldTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Declares one version of a schema
///
/// The GUID identifies the version; the name identifies the logical schema
/// across versions. Field changes must always come with a new GUID: a schema
/// already registered under a GUID is bound as-is, whatever the local
/// declaration says.
///
/// # Example
///
/// ```rust
/// use extensible_storage::models::{FieldDescriptor, SchemaDescription};
///
/// let metadata = SchemaDescription::parse("6f4ec8b6-0f8b-4d3c-9a70-3f1b2c0d5e11", "Metadata")
///     .unwrap()
///     .with_documentation("Project metadata")
///     .with_field(FieldDescriptor::simple("revision", "int32").unwrap())
///     .unwrap();
/// assert_eq!(metadata.fields().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescription {
    guid: Uuid,
    name: String,
    documentation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_guid: Option<Uuid>,
    read_access: AccessLevel,
    write_access: AccessLevel,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescription {
    pub fn new(guid: Uuid, name: impl Into<String>) -> Self {
        Self {
            guid,
            name: name.into(),
            documentation: String::new(),
            vendor_id: None,
            application_guid: None,
            read_access: AccessLevel::Public,
            write_access: AccessLevel::Public,
            fields: Vec::new(),
        }
    }

    /// Create a description from a GUID string
    pub fn parse(guid: &str, name: impl Into<String>) -> Result<Self> {
        Ok(Self::new(parse_guid(guid)?, name))
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn with_vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    pub fn with_application_guid(mut self, guid: Uuid) -> Self {
        self.application_guid = Some(guid);
        self
    }

    pub fn with_read_access(mut self, level: AccessLevel) -> Self {
        self.read_access = level;
        self
    }

    pub fn with_write_access(mut self, level: AccessLevel) -> Self {
        self.write_access = level;
        self
    }

    /// Add a field after validating it
    ///
    /// A field re-declaring an existing name replaces the earlier one and
    /// moves to the end of the field list.
    pub fn with_field(mut self, field: FieldDescriptor) -> Result<Self> {
        field.validate()?;
        self.fields.retain(|existing| existing.name() != field.name());
        self.fields.push(field);
        Ok(self)
    }

    /// Include every field of a table, in table order
    pub fn include(self, table: &FieldTable) -> Result<Self> {
        table
            .fields()
            .iter()
            .cloned()
            .try_fold(self, |description, field| description.with_field(field))
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn vendor_id(&self) -> Option<&str> {
        self.vendor_id.as_deref()
    }

    pub fn application_guid(&self) -> Option<Uuid> {
        self.application_guid
    }

    pub fn read_access(&self) -> AccessLevel {
        self.read_access
    }

    pub fn write_access(&self) -> AccessLevel {
        self.write_access
    }

    /// Flattened fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

/// Parse a GUID string, rejecting malformed input
pub fn parse_guid(guid: &str) -> Result<Uuid> {
    Uuid::parse_str(guid.trim())
        .map_err(|_| ExtensibleStorageError::InvalidSchemaIdError(guid.to_string()))
}

/// Shared handle to a finished host schema
pub type SchemaHandle = Arc<Schema>;

/// An immutable schema registered with the host
///
/// Once finished, its GUID, name and fields never change. Access checks are
/// not part of this value: they depend on the caller and are queried from the
/// host each time.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    guid: Uuid,
    name: String,
    documentation: String,
    vendor_id: Option<String>,
    application_guid: Option<Uuid>,
    read_access: AccessLevel,
    write_access: AccessLevel,
    fields: Vec<Field>,
}

impl Schema {
    /// Used by host implementations when finishing a schema builder
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guid: Uuid,
        name: impl Into<String>,
        documentation: impl Into<String>,
        vendor_id: Option<String>,
        application_guid: Option<Uuid>,
        read_access: AccessLevel,
        write_access: AccessLevel,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            guid,
            name: name.into(),
            documentation: documentation.into(),
            vendor_id,
            application_guid,
            read_access,
            write_access,
            fields,
        }
    }

    /// Stand-in for a sub-schema the host does not know, carried by invalid
    /// nested entities
    pub(crate) fn unregistered(guid: Uuid) -> Self {
        Self::new(
            guid,
            "",
            "",
            None,
            None,
            AccessLevel::Public,
            AccessLevel::Public,
            Vec::new(),
        )
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The overall description of the schema
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn vendor_id(&self) -> Option<&str> {
        self.vendor_id.as_deref()
    }

    pub fn application_guid(&self) -> Option<Uuid> {
        self.application_guid
    }

    pub fn read_access_level(&self) -> AccessLevel {
        self.read_access
    }

    pub fn write_access_level(&self) -> AccessLevel {
        self.write_access
    }

    /// Fields in the order they were added to the builder
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The complete list of fields, sorted by name
    pub fn list_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));
        fields
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_table() -> FieldTable {
        FieldTable::new("Tracked")
            .with_field(FieldDescriptor::simple("created_by", "string").unwrap())
            .with_field(FieldDescriptor::simple("revision", "int16").unwrap())
    }

    #[test]
    fn test_parse_rejects_malformed_guid() {
        assert!(matches!(
            SchemaDescription::parse("not-a-guid", "Broken"),
            Err(ExtensibleStorageError::InvalidSchemaIdError(_))
        ));
    }

    #[test]
    fn test_include_flattens_base_first() {
        let description = SchemaDescription::new(Uuid::new_v4(), "Door")
            .include(&base_table())
            .unwrap()
            .with_field(FieldDescriptor::simple("width", "double").unwrap())
            .unwrap();

        let names: Vec<&str> = description.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["created_by", "revision", "width"]);
    }

    #[test]
    fn test_redeclared_field_wins_and_moves_last() {
        let description = SchemaDescription::new(Uuid::new_v4(), "Door")
            .include(&base_table())
            .unwrap()
            .with_field(FieldDescriptor::simple("revision", "int32").unwrap())
            .unwrap();

        let names: Vec<&str> = description.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["created_by", "revision"]);
        let revision = description.get_field("revision").unwrap();
        assert_eq!(revision.value_type(), crate::models::ValueType::Int32);
    }

    #[test]
    fn test_entity_field_without_sub_schema_rejected_at_declaration() {
        let result = SchemaDescription::new(Uuid::new_v4(), "Parent")
            .with_field(FieldDescriptor::simple("child", "entity").unwrap());
        assert!(matches!(
            result,
            Err(ExtensibleStorageError::MissingSubSchemaError(_))
        ));
    }

    #[test]
    fn test_list_fields_sorted_by_name() {
        let guid = Uuid::new_v4();
        let schema = Schema::new(
            guid,
            "Sorted",
            "",
            None,
            None,
            AccessLevel::Public,
            AccessLevel::Public,
            vec![
                Field::new(guid, "zeta", crate::models::ContainerType::Simple, crate::models::ValueType::Int32),
                Field::new(guid, "alpha", crate::models::ContainerType::Simple, crate::models::ValueType::Int32),
            ],
        );
        let names: Vec<&str> = schema.list_fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(schema.fields()[0].name(), "zeta");
    }
}
