//! Entity access
//!
//! - wrapper: typed get/set/clear on a detached entity
//! - convert: semantic values to and from the host's container form
//! - migration: copying data forward from older schema versions
//! - scope: open/modify/commit of an element's entity

pub mod convert;
pub mod migration;
pub mod scope;
pub mod wrapper;

pub use convert::convert_to_generic;
pub use migration::{MigrationReport, transfer_field_data, update_schema_entities};
pub use scope::{EntityScope, with_entity};
pub use wrapper::{Entity, FromValue};
