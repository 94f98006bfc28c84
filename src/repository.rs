//! Typed repository over one DynamoDB table.
//!
//! A [`Repository`] binds a table name, its key schema and a default projection to a
//! [`StoreClient`], and exposes the eight record operations: find, search, list, batch get, add,
//! update, expression update and delete. Every write stamps the `createdAt` and `updatedAt`
//! bookkeeping attributes and runs the configured [`UpsertHook`](hook::UpsertHook) first.

/// Repository configuration.
pub mod config;

/// Validation and derivation hook run before every write.
pub mod hook;

use crate::{
    common::{
        self,
        item::{self, AttributeMap, Item, TimestampPolicy},
        key::{KeySchema, Keys},
        reserved,
    },
    error::{Error, Result},
    expression::{projection::Projection, rewrite, update, values},
    store::{
        BatchGetRequest, DeleteRequest, GetRequest, IndexSelector, PutRequest, QueryRequest,
        ScanRequest, StoreClient, UpdateRequest,
    },
};

use aws_sdk_dynamodb::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{collections, marker};

type Names = collections::HashMap<String, String>;

/// emit a progress event when logging is enabled
macro_rules! progress {
    ($flags:expr, $($arg:tt)+) => {
        if $flags.logging {
            tracing::info!($($arg)+);
        }
    };
}

/// Arguments of [`Repository::search_items`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Search {
    /// Key condition, e.g. `country = :country AND birthYearMonth = :birthYearMonth`.
    pub key_condition_expression: String,
    /// Placeholder values; each field `f` is bound to `:f`.
    pub values: Item,
    /// Index to query.
    pub index: IndexSelector,
    /// Fields to read instead of the default projection.
    pub projection: Option<Vec<String>>,
    /// Alias entries replacing the ones derived from the declared fields.
    ///
    /// The aliases of the projection are always added.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
}

/// Arguments of [`Repository::update_expression_item`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionUpdate {
    /// Caller-authored assignments, without the leading `SET`, e.g. `role = :role`.
    pub update_expression: String,
    /// Values of the placeholders used by the update expression.
    pub values: Item,
    /// The record; fields not assigned by the update expression are assigned from it.
    pub item: Item,
    /// Alias entries replacing the generated ones.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// How `updatedAt` is stamped.
    pub timestamp: TimestampPolicy,
}

/// Typed repository over one table.
///
/// `T` is the record type returned by reads; writes accept anything serializing to a map.
///
/// ```no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_repo::{
///     common::{item::TimestampPolicy, key::KeySchema},
///     repository::{Repository, config::RepositoryConfig},
/// };
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize, Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct User {
///     id: String,
///     first_name: Option<String>,
///     role: Option<String>,
/// }
///
/// # async fn example() -> dynamodb_repo::error::Result<()> {
/// # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
/// let config = RepositoryConfig::new("user", KeySchema::new("id"))
///     .with_projection(["id", "firstName", "role"]);
/// let users: Repository<User> = Repository::new(client, config);
/// users
///     .add_item(&json!({"id": "1", "firstName": "John", "role": "user"}), TimestampPolicy::Replace)
///     .await?;
/// let user = users.find_item(&json!({"id": "1"}), None).await?;
/// # Ok(())
/// # }
/// ```
pub struct Repository<T, C = Client> {
    client: C,
    table_name: String,
    key_schema: KeySchema,
    projection: Projection,
    flags: config::Flags,
    upsert_hook: hook::UpsertHook,
    entity: marker::PhantomData<fn() -> T>,
}

impl<T, C> Repository<T, C> {
    /// Bind `client` to the configured table, with the identity upsert hook.
    pub fn new(client: C, config: config::RepositoryConfig) -> Self {
        Self {
            client,
            table_name: config.table_name,
            key_schema: config.key_schema,
            projection: Projection::new(config.projection),
            flags: config.flags,
            upsert_hook: hook::UpsertHook::default(),
            entity: marker::PhantomData,
        }
    }

    /// Replace the upsert hook.
    pub fn with_upsert_hook(mut self, upsert_hook: hook::UpsertHook) -> Self {
        self.upsert_hook = upsert_hook;
        self
    }

    /// Replace the upsert hook in place.
    pub fn set_upsert_hook(&mut self, upsert_hook: hook::UpsertHook) {
        self.upsert_hook = upsert_hook;
    }

    /// Replace the declared fields, and with them the default projection and the aliases.
    pub fn set_projection<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::new(fields);
    }

    /// The store client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The key schema.
    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    /// The projection descriptor.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    fn keys_of<K: Serialize + ?Sized>(&self, key: &K) -> Result<Option<Keys<Value>>> {
        Ok(self.key_schema.keys(&item::to_item(key)?))
    }

    fn describe_keys(&self, item: &Item) -> String {
        self.key_schema
            .keys(item)
            .map(|keys| keys.to_string())
            .unwrap_or_else(|| "{}".to_string())
    }
}

fn projection_parts(projection: Option<common::ExpressionInput>) -> (Option<String>, Option<Names>) {
    match projection {
        Some(projection) => {
            let (expression, names, _) = projection.into_parts();
            (Some(expression), names)
        }
        None => (None, None),
    }
}

fn decode<T: DeserializeOwned>(item: AttributeMap) -> Result<T> {
    Ok(serde_dynamo::from_item(item)?)
}

impl<T, C> Repository<T, C>
where
    T: DeserializeOwned,
    C: StoreClient,
{
    async fn get(&self, keys: Keys<Value>, fields: Option<&[&str]>) -> Result<Option<AttributeMap>> {
        let key_description = keys.to_string();
        let (projection_expression, expression_attribute_names) =
            projection_parts(self.projection.resolve(fields));
        let request = GetRequest {
            table_name: self.table_name.clone(),
            key: keys.try_into()?,
            projection_expression,
            expression_attribute_names,
        };
        self.client.get_item(request).await.map_err(Error::remote(format!(
            "Error finding {} by key {key_description}",
            self.table_name
        )))
    }

    /// Read one record by key.
    ///
    /// `key` must carry the key attributes; when one is missing nothing is read and `None` is
    /// returned. `projection` overrides the default projection for this call.
    pub async fn find_item<K>(&self, key: &K, projection: Option<&[&str]>) -> Result<Option<T>>
    where
        K: Serialize + ?Sized,
    {
        let Some(keys) = self.keys_of(key)? else {
            return Ok(None);
        };
        progress!(self.flags, table = %self.table_name, key = %keys, "finding item");
        let item = self.get(keys, projection).await?;
        progress!(self.flags, table = %self.table_name, found = item.is_some(), "finding item done");
        item.map(decode).transpose()
    }

    /// Query records by key condition, against the table or one of its indexes.
    ///
    /// Only the first page of results is returned.
    pub async fn search_items(&self, search: Search) -> Result<Vec<T>> {
        progress!(
            self.flags,
            table = %self.table_name,
            key_condition = %search.key_condition_expression,
            "searching items"
        );
        let expression_attribute_values = values::placeholder_values(&search.values)?;
        let (projection_expression, projection_names) =
            projection_parts(self.projection.resolve(search.projection.as_deref()));
        let mut names = search.expression_attribute_names.unwrap_or_else(|| {
            self.projection
                .aliases()
                .names_for(rewrite::escaped_names(&search.key_condition_expression))
        });
        names.extend(projection_names.unwrap_or_default());
        let context = format!(
            "Error searching {} by key condition `{}` with values {}",
            self.table_name,
            search.key_condition_expression,
            serde_json::to_string(&search.values).unwrap_or_default()
        );
        let request = QueryRequest {
            table_name: self.table_name.clone(),
            index: search.index,
            key_condition_expression: search.key_condition_expression,
            expression_attribute_names: (!names.is_empty()).then_some(names),
            expression_attribute_values: (!expression_attribute_values.is_empty())
                .then_some(expression_attribute_values),
            projection_expression,
        };
        let items = self
            .client
            .query(request)
            .await
            .map_err(Error::remote(context))?;
        progress!(self.flags, table = %self.table_name, count = items.len(), "searching items done");
        items.into_iter().map(decode).collect()
    }

    /// Read every record of the table.
    ///
    /// Only the first page of results is returned.
    pub async fn get_all_items(&self, projection: Option<&[&str]>) -> Result<Vec<T>> {
        progress!(self.flags, table = %self.table_name, "getting all items");
        let (projection_expression, expression_attribute_names) =
            projection_parts(self.projection.resolve(projection));
        let request = ScanRequest {
            table_name: self.table_name.clone(),
            projection_expression,
            expression_attribute_names,
        };
        let items = self.client.scan(request).await.map_err(Error::remote(format!(
            "Error getting all items from {}",
            self.table_name
        )))?;
        progress!(self.flags, table = %self.table_name, count = items.len(), "getting all items done");
        items.into_iter().map(decode).collect()
    }

    /// Read several records by key, in no particular order.
    ///
    /// Keys missing a key attribute are skipped; an empty key list makes no call.
    pub async fn batch_get_items<K: Serialize>(&self, keys: &[K]) -> Result<Vec<T>> {
        let mut attributes: Vec<AttributeMap> = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(keys) = self.keys_of(key)? {
                attributes.push(keys.try_into()?);
            }
        }
        if attributes.is_empty() {
            return Ok(Vec::new());
        }
        progress!(self.flags, table = %self.table_name, count = attributes.len(), "batch getting items");
        let request = BatchGetRequest {
            table_name: self.table_name.clone(),
            keys: attributes,
        };
        let items = self
            .client
            .batch_get_item(request)
            .await
            .map_err(Error::remote(format!(
                "Error batch getting items from {}",
                self.table_name
            )))?;
        progress!(self.flags, table = %self.table_name, count = items.len(), "batch getting items done");
        items.into_iter().map(decode).collect()
    }

    /// Write a whole record, replacing any record with the same key.
    ///
    /// The upsert hook runs first; both bookkeeping timestamps are then stamped according to
    /// `timestamps`. An empty record is not written.
    pub async fn add_item<R>(&self, item: &R, timestamps: TimestampPolicy) -> Result<()>
    where
        R: Serialize + ?Sized,
    {
        let item = item::to_item(item)?;
        if item.is_empty() {
            return Ok(());
        }
        let key_description = self.describe_keys(&item);
        progress!(self.flags, table = %self.table_name, key = %key_description, "adding item");
        let mut item = self.upsert_hook.apply(item)?;
        let now = item::now();
        for field in item::BOOKKEEPING_FIELDS {
            timestamps.stamp(&mut item, field, now);
        }
        let request = PutRequest {
            table_name: self.table_name.clone(),
            item: serde_dynamo::to_item(item)?,
        };
        self.client.put_item(request).await.map_err(Error::remote(format!(
            "Error adding {} with key {key_description}",
            self.table_name
        )))?;
        progress!(self.flags, table = %self.table_name, key = %key_description, "adding item done");
        Ok(())
    }

    /// Assign every field of `item` on the record with key `key`.
    ///
    /// Key attributes are never assigned, `updatedAt` is stamped according to `timestamp` and
    /// `createdAt` is only written when the record has none. When existence confirmation is
    /// enabled, a missing record fails with [`Error::NotFound`]; otherwise the update creates
    /// it.
    pub async fn update_item<K, R>(&self, key: &K, item: &R, timestamp: TimestampPolicy) -> Result<()>
    where
        K: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        let Some(keys) = self.keys_of(key)? else {
            return Ok(());
        };
        let item = item::to_item(item)?;
        let key_description = keys.to_string();
        progress!(self.flags, table = %self.table_name, key = %key_description, "updating item");
        let mut item = self.upsert_hook.apply(item)?;
        if self.flags.confirm_existence_before_update
            && self.get(keys.clone(), None).await?.is_none()
        {
            return Err(Error::NotFound {
                table: self.table_name.clone(),
                key: key_description,
            });
        }
        let now = item::now();
        timestamp.stamp(&mut item, item::UPDATED_AT, now);
        let aliases = self.projection.aliases().with_fields(item.keys());
        let assignments = update::assignments(&item, &self.key_schema, &aliases, now)?;
        let (expression, expression_attribute_names, expression_attribute_values) =
            assignments.into_parts();
        let request = UpdateRequest {
            table_name: self.table_name.clone(),
            key: keys.try_into()?,
            update_expression: format!("SET {expression}"),
            expression_attribute_names,
            expression_attribute_values,
        };
        self.client.update_item(request).await.map_err(Error::remote(format!(
            "Error updating {} with key {key_description}",
            self.table_name
        )))?;
        progress!(self.flags, table = %self.table_name, key = %key_description, "updating item done");
        Ok(())
    }

    /// Apply a caller-authored update expression, completed with the rest of the record.
    ///
    /// Reserved attribute names in the fragment are escaped, fields it assigns are dropped from
    /// the record, and the remaining fields are assigned like [`update_item`](Self::update_item)
    /// does. Nothing is sent when the expression or the record is empty. Existence is never
    /// confirmed.
    pub async fn update_expression_item<K>(&self, key: &K, update: ExpressionUpdate) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        let Some(keys) = self.keys_of(key)? else {
            return Ok(());
        };
        if update.update_expression.trim().is_empty() || update.item.is_empty() {
            return Ok(());
        }
        let key_description = keys.to_string();
        progress!(
            self.flags,
            table = %self.table_name,
            key = %key_description,
            expression = %update.update_expression,
            "updating item by expression"
        );
        let mut item = self.upsert_hook.apply(update.item)?;
        let now = item::now();
        update.timestamp.stamp(&mut item, item::UPDATED_AT, now);
        let rewrite = rewrite::rewrite(&update.update_expression, &item, reserved::is_reserved);
        let aliases = self.projection.aliases().with_fields(rewrite.residual.keys());
        let generated = update::assignments(&rewrite.residual, &self.key_schema, &aliases, now)?;
        let fragment = common::ExpressionInput {
            expression: rewrite.expression,
            expression_attribute_names: rewrite.expression_attribute_names,
            expression_attribute_values: values::placeholder_values(&update.values)?,
        };
        let (expression, generated_names, expression_attribute_values) =
            common::ExpressionInput::merge(", ", vec![generated, fragment]).into_parts();
        let update_expression = format!("SET {expression}");
        let context = format!(
            "Error updating {} with key {key_description} and expression `{update_expression}`",
            self.table_name
        );
        let request = UpdateRequest {
            table_name: self.table_name.clone(),
            key: keys.try_into()?,
            update_expression,
            expression_attribute_names: update.expression_attribute_names.or(generated_names),
            expression_attribute_values,
        };
        self.client
            .update_item(request)
            .await
            .map_err(Error::remote(context))?;
        progress!(
            self.flags,
            table = %self.table_name,
            key = %key_description,
            "updating item by expression done"
        );
        Ok(())
    }

    /// Delete the record with key `key`; deleting a missing record succeeds.
    pub async fn delete_item<K>(&self, key: &K) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        let Some(keys) = self.keys_of(key)? else {
            return Ok(());
        };
        let key_description = keys.to_string();
        progress!(self.flags, table = %self.table_name, key = %key_description, "deleting item");
        let request = DeleteRequest {
            table_name: self.table_name.clone(),
            key: keys.try_into()?,
        };
        self.client.delete_item(request).await.map_err(Error::remote(format!(
            "Error deleting {} with key {key_description}",
            self.table_name
        )))?;
        progress!(self.flags, table = %self.table_name, key = %key_description, "deleting item done");
        Ok(())
    }
}
