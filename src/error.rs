use crate::store::StoreError;

use thiserror::Error;

/// A record rejected by an upsert hook.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Create a validation error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The upsert hook rejected the record; nothing was sent to the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The item to update does not exist.
    #[error("Error updating {table} with key {key} - not found")]
    NotFound {
        /// Table name.
        table: String,
        /// Key of the missing item, as JSON.
        key: String,
    },
    /// The store rejected or failed the call.
    #[error("{context}: {source}")]
    Remote {
        /// Operation, table and key or expression involved.
        context: String,
        /// Error reported by the store client.
        source: StoreError,
    },
    /// A record could not be converted to or from named fields.
    #[error("invalid record: {0}")]
    Json(#[from] serde_json::Error),
    /// A record could not be converted to or from DynamoDB attribute values.
    #[error("invalid attribute value: {0}")]
    Attribute(#[from] serde_dynamo::Error),
}

impl Error {
    pub(crate) fn remote(context: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let context = context.into();
        move |source| Self::Remote { context, source }
    }
}

/// Result type for repository operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
