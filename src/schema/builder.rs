//! Schema builder adapter
//!
//! Drives the host's schema builder from a [`SchemaDescription`]. Every value
//! is validated before it is handed to the host, and the builder is only
//! finished once all steps succeeded: a failed build registers nothing.

use tracing::{debug, info};

use crate::error::{ExtensibleStorageError, Result};
use crate::models::{
    AccessLevel, ContainerType, FieldDescriptor, SchemaDescription, SchemaHandle, SpecTypeId,
};
use crate::storage::{FieldBuilder, Host, SchemaBuilder};

/// Build and register a host schema from its description
///
/// # Example
///
/// ```rust
/// use extensible_storage::models::{FieldDescriptor, SchemaDescription};
/// use extensible_storage::schema::build_schema;
/// use extensible_storage::storage::MemoryHost;
///
/// let host = MemoryHost::new();
/// let description = SchemaDescription::parse("0b7f3c1e-6a52-4f0e-8d1d-2c6a9b4e7f10", "Notes")
///     .unwrap()
///     .with_field(FieldDescriptor::simple("text", "string").unwrap())
///     .unwrap();
/// let schema = build_schema(&host, &description).unwrap();
/// assert_eq!(schema.name(), "Notes");
/// ```
pub fn build_schema<H: Host + ?Sized>(
    host: &H,
    description: &SchemaDescription,
) -> Result<SchemaHandle> {
    let guid = description.guid();
    if !host.guid_is_valid(guid) {
        return Err(ExtensibleStorageError::InvalidSchemaIdError(guid.to_string()));
    }

    let mut builder = host.schema_builder(guid)?;

    let name = description.name();
    if !builder.acceptable_name(name) {
        return Err(ExtensibleStorageError::InvalidSchemaNameError(
            name.to_string(),
        ));
    }
    builder.set_schema_name(name)?;
    debug!("Schema {}: name '{}'", guid, name);

    builder.set_documentation(description.documentation());
    debug!("Schema {}: documentation set", guid);

    set_access_levels(builder.as_mut(), description)?;

    if let Some(vendor_id) = description.vendor_id() {
        if !host.vendor_id_is_valid(vendor_id) {
            return Err(ExtensibleStorageError::InvalidVendorIdError(
                vendor_id.to_string(),
            ));
        }
        builder.set_vendor_id(vendor_id)?;
        debug!("Schema {}: vendor id '{}'", guid, vendor_id);
    }

    if let Some(application_guid) = description.application_guid() {
        if !host.guid_is_valid(application_guid) {
            return Err(ExtensibleStorageError::InvalidApplicationIdError(
                application_guid.to_string(),
            ));
        }
        builder.set_application_guid(application_guid)?;
        debug!("Schema {}: application GUID {}", guid, application_guid);
    }

    for field in description.fields() {
        add_field(builder.as_mut(), field)?;
    }

    let schema = builder.finish()?;
    info!(
        "Built schema '{}' ({}) with {} fields",
        schema.name(),
        schema.guid(),
        schema.fields().len()
    );
    Ok(schema)
}

// A restricted level is only usable when the matching provenance is declared.
fn set_access_levels(
    builder: &mut dyn SchemaBuilder,
    description: &SchemaDescription,
) -> Result<()> {
    for level in [description.read_access(), description.write_access()] {
        let reason = match level {
            AccessLevel::Vendor if description.vendor_id().is_none() => {
                Some("vendor access requires a vendor id")
            }
            AccessLevel::Application if description.application_guid().is_none() => {
                Some("application access requires an application GUID")
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(ExtensibleStorageError::InvalidAccessLevelError {
                level: level.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    builder.set_read_access_level(description.read_access());
    builder.set_write_access_level(description.write_access());
    debug!(
        "Access levels: read {}, write {}",
        description.read_access(),
        description.write_access()
    );
    Ok(())
}

fn add_field(builder: &mut dyn SchemaBuilder, field: &FieldDescriptor) -> Result<()> {
    let name = field.name();
    if !builder.acceptable_name(name) {
        return Err(ExtensibleStorageError::InvalidFieldNameError(
            name.to_string(),
        ));
    }
    field.validate()?;

    let field_builder: &mut dyn FieldBuilder = match field.container_type() {
        ContainerType::Simple => builder.add_simple_field(name, field.value_type())?,
        ContainerType::Array => builder.add_array_field(name, field.value_type())?,
        ContainerType::Map => {
            let key_type = field
                .key_type()
                .ok_or_else(|| ExtensibleStorageError::MissingKeyTypeError(name.to_string()))?;
            builder.add_map_field(name, key_type, field.value_type())?
        }
    };
    debug!("Field '{}': {}", name, field.field_type());

    field_builder.set_documentation(field.documentation());

    if field_builder.needs_units() {
        let spec = field.spec().cloned().unwrap_or(SpecTypeId::NUMBER);
        field_builder.set_spec(&spec)?;
        debug!("Field '{}': spec {}", name, spec);
    }

    if field_builder.needs_sub_schema_guid() {
        let sub_schema = field
            .sub_schema_guid()
            .filter(|guid| !guid.is_nil())
            .ok_or_else(|| ExtensibleStorageError::MissingSubSchemaError(name.to_string()))?;
        field_builder.set_sub_schema_guid(sub_schema)?;
        debug!("Field '{}': sub-schema {}", name, sub_schema);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Schema, UnitTypeId};
    use crate::storage::{MemoryHost, SchemaRegistry, StorageError, UnitCatalog};
    use uuid::Uuid;

    /// Host that only accepts random (version 4) GUIDs
    struct RandomGuidHost(MemoryHost);

    impl SchemaRegistry for RandomGuidHost {
        fn guid_is_valid(&self, guid: Uuid) -> bool {
            guid.get_version_num() == 4
        }

        fn vendor_id_is_valid(&self, vendor_id: &str) -> bool {
            self.0.vendor_id_is_valid(vendor_id)
        }

        fn lookup(&self, guid: Uuid) -> Option<SchemaHandle> {
            self.0.lookup(guid)
        }

        fn list_schemas(&self) -> Vec<SchemaHandle> {
            self.0.list_schemas()
        }

        fn schema_builder(
            &self,
            guid: Uuid,
        ) -> std::result::Result<Box<dyn SchemaBuilder + '_>, StorageError> {
            self.0.schema_builder(guid)
        }

        fn read_access_granted(&self, schema: &Schema) -> bool {
            self.0.read_access_granted(schema)
        }

        fn write_access_granted(&self, schema: &Schema) -> bool {
            self.0.write_access_granted(schema)
        }
    }

    impl UnitCatalog for RandomGuidHost {
        fn is_measurable_spec(&self, spec: &SpecTypeId) -> bool {
            self.0.is_measurable_spec(spec)
        }

        fn valid_units(&self, spec: &SpecTypeId) -> Vec<UnitTypeId> {
            self.0.valid_units(spec)
        }
    }

    #[test]
    fn test_nil_guid_rejected_before_builder_opens() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::nil(), "Nothing");
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidSchemaIdError(_))
        ));
    }

    #[test]
    fn test_application_guid_checked_by_host() {
        let host = RandomGuidHost(MemoryHost::new());
        let derived = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"application");
        let description =
            SchemaDescription::new(Uuid::new_v4(), "Owned").with_application_guid(derived);
        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidApplicationIdError(id)) if id == derived.to_string()
        ));
        assert_eq!(host.0.finished_builds(), 0);

        let description =
            SchemaDescription::new(Uuid::new_v4(), "Owned").with_application_guid(Uuid::new_v4());
        assert!(build_schema(&host, &description).is_ok());
    }

    #[test]
    fn test_bad_field_name_leaves_no_schema() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "Broken")
            .with_field(FieldDescriptor::simple("fine", "int32").unwrap())
            .unwrap()
            .with_field(FieldDescriptor::simple("not fine", "int32").unwrap())
            .unwrap();

        assert!(matches!(
            build_schema(&host, &description),
            Err(ExtensibleStorageError::InvalidFieldNameError(name)) if name == "not fine"
        ));
        assert!(host.list_schemas().is_empty());
    }

    #[test]
    fn test_measurable_field_defaults_to_number_spec() {
        let host = MemoryHost::new();
        let description = SchemaDescription::new(Uuid::new_v4(), "Ratios")
            .with_field(FieldDescriptor::simple("ratio", "double").unwrap())
            .unwrap();
        let schema = build_schema(&host, &description).unwrap();
        let ratio = schema.get_field("ratio").unwrap();
        assert_eq!(ratio.spec(), Some(&SpecTypeId::NUMBER));
    }
}
