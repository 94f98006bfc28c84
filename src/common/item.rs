use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, ser};
use serde_json::Value;
use std::collections;

/// Attribute holding the time an item was first written.
pub const CREATED_AT: &str = "createdAt";

/// Attribute holding the time an item was last written.
pub const UPDATED_AT: &str = "updatedAt";

/// Bookkeeping attributes carried by every item, in projection order.
pub const BOOKKEEPING_FIELDS: [&str; 2] = [CREATED_AT, UPDATED_AT];

/// A record as an ordered map from attribute name to value.
///
/// Field order is the order in which expressions and placeholders are generated.
pub type Item = IndexMap<String, Value>;

/// A record in DynamoDB wire form.
pub type AttributeMap = collections::HashMap<String, types::AttributeValue>;

/// How bookkeeping timestamps are stamped on a write.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum TimestampPolicy {
    /// Always overwrite with the current time.
    #[default]
    Replace,
    /// Keep a value supplied on the record; stamp the current time only when it is missing.
    Preserve,
}

impl TimestampPolicy {
    /// Stamp `field` on `item` according to this policy.
    pub fn stamp(self, item: &mut Item, field: &str, now: i64) {
        let keep = matches!(self, Self::Preserve)
            && item.get(field).is_some_and(|value| !value.is_null());
        if !keep {
            item.insert(field.to_string(), Value::from(now));
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Convert any serializable record into an [`Item`].
///
/// Fields serialized as `null` are kept as explicit nulls; the record itself must serialize
/// to a map.
pub fn to_item<T: Serialize + ?Sized>(record: &T) -> serde_json::Result<Item> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(ser::Error::custom(format!(
            "expected a record with named fields, found {other}"
        ))),
    }
}
