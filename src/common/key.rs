use crate::common::item;

use aws_sdk_dynamodb::types;
use serde::{Deserialize, Serialize};
use serde_dynamo::{Error, Result, to_attribute_value};
use serde_json::Value;
use std::{collections, fmt};

/// Key component.
///
/// ```rust
/// use dynamodb_repo::common::key;
///
/// let key = key::Key {
///     name: "id".to_string(),
///     value: "1".to_string(),
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

/// Primary key (partition key and optional sort key).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys<T> {
    /// The partition key (required).
    pub partition_key: Key<T>,
    /// The sort key (optional, only for tables with composite primary keys).
    pub sort_key: Option<Key<T>>,
}

impl<T: Serialize> TryFrom<Keys<T>> for collections::HashMap<String, types::AttributeValue> {
    type Error = Error;

    fn try_from(key: Keys<T>) -> Result<Self> {
        let partition_key_value = to_attribute_value(key.partition_key.value)?;
        let mut keys = Self::from([(key.partition_key.name, partition_key_value)]);
        if let Some(sort_key) = key.sort_key {
            let sort_key_value = to_attribute_value(sort_key.value)?;
            keys.insert(sort_key.name, sort_key_value);
        }
        Ok(keys)
    }
}

/// Renders as a compact JSON object, e.g. `{"id":"1"}`.
impl<T: fmt::Display> fmt::Display for Keys<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}:{}",
            Value::from(self.partition_key.name.as_str()),
            self.partition_key.value
        )?;
        if let Some(sort_key) = &self.sort_key {
            write!(f, ",{}:{}", Value::from(sort_key.name.as_str()), sort_key.value)?;
        }
        write!(f, "}}")
    }
}

/// Key descriptor: the attribute names forming a table's primary key.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeySchema {
    /// Partition key attribute name.
    pub partition_key: String,
    /// Sort key attribute name, for composite primary keys.
    #[serde(default)]
    pub sort_key: Option<String>,
}

impl KeySchema {
    /// Key schema with a partition key only.
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Key schema with a partition key and a sort key.
    pub fn composite(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: Some(sort_key.into()),
        }
    }

    /// Whether `field` is one of the key attributes.
    pub fn contains(&self, field: &str) -> bool {
        self.partition_key == field || self.sort_key.as_deref() == Some(field)
    }

    /// Extract the key of `item`.
    ///
    /// Returns `None` when a declared key attribute is missing or null.
    pub fn keys(&self, item: &item::Item) -> Option<Keys<Value>> {
        let key = |name: &str| {
            item.get(name)
                .filter(|value| !value.is_null())
                .map(|value| Key {
                    name: name.to_string(),
                    value: value.clone(),
                })
        };
        let partition_key = key(&self.partition_key)?;
        let sort_key = match &self.sort_key {
            Some(name) => Some(key(name)?),
            None => None,
        };
        Some(Keys {
            partition_key,
            sort_key,
        })
    }
}
