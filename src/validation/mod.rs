//! Validation functionality
//!
//! Provides:
//! - Type resolution (value/key types, container type tokens, field lookup)
//! - Host naming rules (schema names, field names, vendor ids)

pub mod naming;
pub mod types;

pub use naming::{is_acceptable_name, is_valid_vendor_id};
pub use types::{
    TypeInput, determine_field_type, resolve_field, resolve_key_type, resolve_value_type,
};
