//! Shared schema objects common to every connection.
//!
//! Pure functions of their inputs; the caller (the relay context) controls
//! when and how often they run.

use super::objects::{FieldType, ObjectDescription};

/// The four standard `PageInfo` field names.
const PAGE_INFO_FIELDS: &[&str] = &[
    "hasNextPage",
    "hasPreviousPage",
    "startCursor",
    "endCursor",
];

/// The shared pagination objects generated for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObjects {
    pub page_info: ObjectDescription,
    pub connection_args: ObjectDescription,
}

/// Build the `PageInfo` object, optionally extending a supplied base type.
///
/// Base fields come first; the four standard Relay fields always win a name
/// clash so the result is polymorphic over "has these four fields".
pub fn page_info_object(prefix: &str, base: Option<&ObjectDescription>) -> ObjectDescription {
    let mut object = ObjectDescription::new(format!("{prefix}PageInfo"));

    if let Some(base) = base {
        for field in &base.fields {
            if !PAGE_INFO_FIELDS.contains(&field.name.as_str()) {
                object.fields.push(field.clone());
            }
        }
    }

    object
        .field("hasNextPage", FieldType::Boolean)
        .field("hasPreviousPage", FieldType::Boolean)
        .nullable_field("startCursor", FieldType::String)
        .nullable_field("endCursor", FieldType::String)
}

/// Build the `ConnectionArguments` input object.
pub fn connection_args_object(prefix: &str) -> ObjectDescription {
    ObjectDescription::input(format!("{prefix}ConnectionArguments"))
        .nullable_field("first", FieldType::Int)
        .nullable_field("after", FieldType::String)
        .nullable_field("last", FieldType::Int)
        .nullable_field("before", FieldType::String)
}
