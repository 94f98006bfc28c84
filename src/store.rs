//! Remote store client.
//!
//! The repository never talks to the network itself. It hands fully built requests to a
//! [`StoreClient`], which is implemented for [`aws_sdk_dynamodb::Client`] and can be swapped
//! for another implementation (e.g. an in-memory table in tests).

/// Store client backed by the AWS SDK.
pub mod dynamodb;

#[cfg(test)]
pub(crate) mod memory;

use crate::common::item::AttributeMap;

use async_trait::async_trait;
use std::collections;

/// Error reported by a store client.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Index a query runs against.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum IndexSelector {
    /// Let the client decide.
    #[default]
    Default,
    /// The base table, never a secondary index.
    BaseTable,
    /// The named secondary index.
    Named(String),
}

impl IndexSelector {
    /// Name of the secondary index to query, if any.
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Default | Self::BaseTable => None,
        }
    }
}

impl From<&str> for IndexSelector {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

/// Point read by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetRequest {
    /// Aliases referenced by the projection.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Primary key.
    pub key: AttributeMap,
    /// Attributes to read; all when `None`.
    pub projection_expression: Option<String>,
    /// Table name.
    pub table_name: String,
}

/// Full overwrite of the item with the same key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutRequest {
    /// The complete item, key included.
    pub item: AttributeMap,
    /// Table name.
    pub table_name: String,
}

/// Partial update by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateRequest {
    /// Aliases referenced by the update expression.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Placeholders referenced by the update expression.
    pub expression_attribute_values: Option<AttributeMap>,
    /// Primary key.
    pub key: AttributeMap,
    /// Table name.
    pub table_name: String,
    /// Update expression, clause keyword included.
    pub update_expression: String,
}

/// Delete by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteRequest {
    /// Primary key.
    pub key: AttributeMap,
    /// Table name.
    pub table_name: String,
}

/// Key-condition query against the table or one of its indexes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryRequest {
    /// Aliases referenced by the key condition and the projection.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Placeholders referenced by the key condition.
    pub expression_attribute_values: Option<AttributeMap>,
    /// Index to query.
    pub index: IndexSelector,
    /// Key condition expression.
    pub key_condition_expression: String,
    /// Attributes to read; all when `None`.
    pub projection_expression: Option<String>,
    /// Table name.
    pub table_name: String,
}

/// Full table scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanRequest {
    /// Aliases referenced by the projection.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Attributes to read; all when `None`.
    pub projection_expression: Option<String>,
    /// Table name.
    pub table_name: String,
}

/// Batch point read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetRequest {
    /// Primary keys to read.
    pub keys: Vec<AttributeMap>,
    /// Table name.
    pub table_name: String,
}

/// Primitive operations of a DynamoDB-compatible store.
///
/// Implementations perform exactly one remote call per method, never follow pagination,
/// never retry, and report failures as [`StoreError`].
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Read one item; `None` when the key has no item.
    async fn get_item(&self, request: GetRequest) -> Result<Option<AttributeMap>, StoreError>;

    /// Write a whole item.
    async fn put_item(&self, request: PutRequest) -> Result<(), StoreError>;

    /// Apply an update expression to one item.
    async fn update_item(&self, request: UpdateRequest) -> Result<(), StoreError>;

    /// Delete one item; deleting an absent key succeeds.
    async fn delete_item(&self, request: DeleteRequest) -> Result<(), StoreError>;

    /// Query items by key condition, in the index's key order.
    async fn query(&self, request: QueryRequest) -> Result<Vec<AttributeMap>, StoreError>;

    /// Read every item of the table.
    async fn scan(&self, request: ScanRequest) -> Result<Vec<AttributeMap>, StoreError>;

    /// Read several items by key.
    async fn batch_get_item(
        &self,
        request: BatchGetRequest,
    ) -> Result<Vec<AttributeMap>, StoreError>;
}
