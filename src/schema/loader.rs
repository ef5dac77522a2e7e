//! Declarative schema documents
//!
//! Loads a [`SchemaDescription`] from YAML or JSON:
//!
//! ```yaml
//! guid: 2d0f1c8e-7b3a-4e59-9c61-0a4b5d6e7f81
//! name: Metadata
//! documentation: Project metadata
//! vendor_id: ACME
//! write_access: vendor
//! fields:
//!   - name: revision
//!     value_type: int32
//!   - name: widths
//!     container: map
//!     key_type: string
//!     value_type: double
//!     spec: spec:length
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtensibleStorageError, Result};
use crate::models::{
    AccessLevel, ContainerType, FieldDescriptor, SchemaDescription, SpecTypeId, parse_guid,
};
use crate::validation::TypeInput;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    guid: String,
    name: String,
    #[serde(default)]
    documentation: String,
    vendor_id: Option<String>,
    application_guid: Option<String>,
    read_access: Option<String>,
    write_access: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDocument {
    name: String,
    container: Option<String>,
    value_type: String,
    key_type: Option<String>,
    spec: Option<String>,
    sub_schema: Option<String>,
    #[serde(default)]
    documentation: String,
}

/// Loader for declarative schema documents
pub struct SchemaLoader;

impl SchemaLoader {
    /// Parse a YAML schema document
    pub fn from_yaml_str(content: &str) -> Result<SchemaDescription> {
        let document: SchemaDocument = serde_yaml::from_str(content)
            .map_err(|e| ExtensibleStorageError::DeserializationError(e.to_string()))?;
        Self::describe(document)
    }

    /// Parse a JSON schema document
    pub fn from_json_str(content: &str) -> Result<SchemaDescription> {
        let document: SchemaDocument = serde_json::from_str(content)
            .map_err(|e| ExtensibleStorageError::DeserializationError(e.to_string()))?;
        Self::describe(document)
    }

    fn describe(document: SchemaDocument) -> Result<SchemaDescription> {
        let mut description = SchemaDescription::new(parse_guid(&document.guid)?, &document.name)
            .with_documentation(document.documentation);

        if let Some(vendor_id) = document.vendor_id {
            description = description.with_vendor_id(vendor_id);
        }
        if let Some(application_guid) = document.application_guid {
            let guid = uuid::Uuid::parse_str(application_guid.trim()).map_err(|_| {
                ExtensibleStorageError::InvalidApplicationIdError(application_guid.clone())
            })?;
            description = description.with_application_guid(guid);
        }
        if let Some(level) = document.read_access {
            description = description.with_read_access(level.parse::<AccessLevel>()?);
        }
        if let Some(level) = document.write_access {
            description = description.with_write_access(level.parse::<AccessLevel>()?);
        }

        for field in document.fields {
            description = description.with_field(Self::describe_field(field)?)?;
        }

        debug!(
            "Loaded schema document '{}' with {} fields",
            description.name(),
            description.fields().len()
        );
        Ok(description)
    }

    fn describe_field(field: FieldDocument) -> Result<FieldDescriptor> {
        let container = match &field.container {
            Some(container) => container.parse::<ContainerType>()?,
            None => ContainerType::Simple,
        };

        let mut descriptor = FieldDescriptor::new(
            field.name,
            container,
            field.value_type,
            field.key_type.map(TypeInput::from),
        )?
        .with_documentation(field.documentation);

        if let Some(spec) = field.spec {
            descriptor = descriptor.with_spec(SpecTypeId::new(spec));
        }
        if let Some(sub_schema) = field.sub_schema {
            descriptor = descriptor.with_sub_schema(parse_guid(&sub_schema)?);
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueType;

    #[test]
    fn test_load_yaml_document() {
        let yaml = r#"
guid: 2d0f1c8e-7b3a-4e59-9c61-0a4b5d6e7f81
name: Metadata
vendor_id: ACME
write_access: Vendor
fields:
  - name: revision
    value_type: integer
  - name: widths
    container: map
    key_type: string
    value_type: double
    spec: "spec:length"
"#;
        let description = SchemaLoader::from_yaml_str(yaml).unwrap();
        assert_eq!(description.name(), "Metadata");
        assert_eq!(description.write_access(), AccessLevel::Vendor);
        assert_eq!(description.fields()[0].value_type(), ValueType::Int32);
        let widths = description.get_field("widths").unwrap();
        assert_eq!(widths.key_type(), Some(ValueType::String));
        assert_eq!(widths.spec(), Some(&SpecTypeId::LENGTH));
    }

    #[test]
    fn test_map_without_key_rejected() {
        let json = r#"{
            "guid": "2d0f1c8e-7b3a-4e59-9c61-0a4b5d6e7f81",
            "name": "Lookup",
            "fields": [{"name": "table", "container": "map", "value_type": "string"}]
        }"#;
        assert!(matches!(
            SchemaLoader::from_json_str(json),
            Err(ExtensibleStorageError::MissingKeyTypeError(_))
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"{"guid": "2d0f1c8e-7b3a-4e59-9c61-0a4b5d6e7f81", "name": "X", "colour": "red"}"#;
        assert!(matches!(
            SchemaLoader::from_json_str(json),
            Err(ExtensibleStorageError::DeserializationError(_))
        ));
    }
}
