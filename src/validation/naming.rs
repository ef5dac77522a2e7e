//! Host naming rules for schema names, field names and vendor ids

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of schema names, field names and vendor ids
pub const MAX_NAME_LENGTH: usize = 255;

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name pattern"));

static VENDOR_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9.]*$").expect("valid vendor id pattern"));

/// Checks whether a schema or field name is acceptable
///
/// Names start with a letter or underscore and contain only letters, digits
/// and underscores.
pub fn is_acceptable_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && NAME_REGEX.is_match(name)
}

/// Checks whether a vendor id is well formed (e.g. `ADSK` or `com.example`)
pub fn is_valid_vendor_id(vendor_id: &str) -> bool {
    vendor_id.len() <= MAX_NAME_LENGTH && VENDOR_ID_REGEX.is_match(vendor_id)
}
