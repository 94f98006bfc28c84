use crate::{common::item::Item, error::ValidationError};

use std::{fmt, sync};

/// Signature of an upsert hook.
pub type UpsertFn = dyn Fn(Item) -> Result<Item, ValidationError> + Send + Sync;

/// Validation and derivation step run on every record before it is written.
///
/// The hook receives the record about to be written (add, update or expression update) and
/// returns the record to write, e.g. with derived index attributes filled in. Returning an
/// error aborts the write before any call reaches the store.
///
/// ```rust
/// use dynamodb_repo::{error::ValidationError, repository::hook::UpsertHook};
/// use serde_json::Value;
///
/// let hook = UpsertHook::new(|mut item| {
///     let email = item
///         .get("email")
///         .and_then(Value::as_str)
///         .ok_or_else(|| ValidationError::new("email is required"))?
///         .to_lowercase();
///     item.insert("emailLower".to_string(), Value::from(email));
///     Ok(item)
/// });
/// # let _ = hook;
/// ```
#[derive(Clone)]
pub struct UpsertHook(sync::Arc<UpsertFn>);

impl UpsertHook {
    /// Wrap a hook function.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(Item) -> Result<Item, ValidationError> + Send + Sync + 'static,
    {
        Self(sync::Arc::new(hook))
    }

    /// Hook returning records unchanged.
    pub fn identity() -> Self {
        Self::new(Ok)
    }

    /// Run the hook.
    pub fn apply(&self, item: Item) -> Result<Item, ValidationError> {
        (self.0)(item)
    }
}

impl Default for UpsertHook {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for UpsertHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpsertHook")
    }
}
