//! Common utilities for repository operations.
//!
//! This module provides shared types and utilities used by the expression builder and the
//! repository, including records, key handling, reserved words and attribute aliases.

/// Attribute name aliases for reserved words.
pub mod alias;

/// Ordered records and bookkeeping timestamps.
pub mod item;

/// Key types for identifying items in DynamoDB tables.
pub mod key;

/// DynamoDB reserved words.
pub mod reserved;

use aws_sdk_dynamodb::types;
use std::collections;

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

fn non_empty<K, V>(map: collections::HashMap<K, V>) -> Option<collections::HashMap<K, V>> {
    if map.is_empty() { None } else { Some(map) }
}

/// An expression together with the attribute names and values it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionInput {
    /// The expression text.
    pub expression: String,
    /// Alias (`#name`) to attribute name mapping.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Placeholder (`:name`) to value mapping.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    /// Concatenate expressions with `operator`, skipping empty ones, and union their maps.
    pub fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    /// Attribute names, or `None` when there are none.
    ///
    /// DynamoDB rejects an empty `ExpressionAttributeNames` map, so an absent map is the
    /// only valid way to say "no aliases".
    pub fn names(&self) -> Option<collections::HashMap<String, String>> {
        non_empty(self.expression_attribute_names.clone())
    }

    /// Split into expression text, optional names and optional values.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        String,
        Option<collections::HashMap<String, String>>,
        Option<collections::HashMap<String, types::AttributeValue>>,
    ) {
        (
            self.expression,
            non_empty(self.expression_attribute_names),
            non_empty(self.expression_attribute_values),
        )
    }
}
