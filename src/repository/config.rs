use crate::common::key::KeySchema;

use serde::Deserialize;

/// Behaviour switches of a repository.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Flags {
    /// Emit progress events for every operation.
    pub logging: bool,
    /// Read the item before `update_item` and fail with `NotFound` when it is missing.
    pub confirm_existence_before_update: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            logging: true,
            confirm_existence_before_update: true,
        }
    }
}

/// Repository configuration.
///
/// ```rust
/// use dynamodb_repo::{common::key::KeySchema, repository::config::RepositoryConfig};
///
/// let config: RepositoryConfig = serde_json::from_str(
///     r#"{
///         "tableName": "user",
///         "partitionKey": "id",
///         "projection": ["id", "firstName", "role"],
///         "flags": {"logging": false}
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.key_schema, KeySchema::new("id"));
/// assert!(config.flags.confirm_existence_before_update);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// The name of the table.
    pub table_name: String,
    /// Partition key and optional sort key attribute names.
    #[serde(flatten)]
    pub key_schema: KeySchema,
    /// Fields read by default, besides the bookkeeping timestamps.
    #[serde(default)]
    pub projection: Vec<String>,
    /// Behaviour switches.
    #[serde(default)]
    pub flags: Flags,
}

impl RepositoryConfig {
    /// Configuration with no projection and default flags.
    pub fn new(table_name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            table_name: table_name.into(),
            key_schema,
            projection: Vec::new(),
            flags: Flags::default(),
        }
    }

    /// Set the fields read by default.
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the behaviour switches.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}
