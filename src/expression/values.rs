use crate::common::item;

use aws_sdk_dynamodb::types;
use serde_dynamo::{Result, to_attribute_value};
use std::collections;

/// Placeholder name for `field`; names already starting with `:` are kept as they are.
pub fn placeholder(field: &str) -> String {
    if field.starts_with(':') {
        field.to_string()
    } else {
        format!(":{field}")
    }
}

/// Placeholder values for query conditions and caller-supplied update values.
///
/// Every field maps to `:field`. Unlike [`update_values`](super::update::update_values), key
/// attributes are kept and no timestamp is added.
pub fn placeholder_values(
    values: &item::Item,
) -> Result<collections::HashMap<String, types::AttributeValue>> {
    let mut placeholders = collections::HashMap::with_capacity(values.len());
    for (field, value) in values {
        placeholders.insert(placeholder(field), to_attribute_value(value)?);
    }
    Ok(placeholders)
}
