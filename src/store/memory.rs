//! In-memory table understanding the expressions this crate generates.

use crate::{
    common::{item::AttributeMap, key::KeySchema, reserved},
    store::{
        BatchGetRequest, DeleteRequest, GetRequest, IndexSelector, PutRequest, QueryRequest,
        ScanRequest, StoreClient, StoreError, UpdateRequest,
    },
};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::{collections, sync};
use tokio::sync::RwLock;

type Names = Option<collections::HashMap<String, String>>;

/// In-memory store for repository tests.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    key_schema: KeySchema,
    items: RwLock<Vec<AttributeMap>>,
    calls: sync::Mutex<Vec<&'static str>>,
    indexes: sync::Mutex<Vec<IndexSelector>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub(crate) fn new(key_schema: KeySchema) -> Self {
        Self {
            key_schema,
            ..Default::default()
        }
    }

    /// A store failing every call with `message`.
    pub(crate) fn failing(key_schema: KeySchema, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(key_schema)
        }
    }

    /// Names of the primitives called so far, in order.
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Indexes targeted by the queries so far, in order.
    pub(crate) fn queried_indexes(&self) -> Vec<IndexSelector> {
        self.indexes.lock().unwrap().clone()
    }

    /// Raw copy of the stored items.
    pub(crate) async fn items(&self) -> Vec<AttributeMap> {
        self.items.read().await.clone()
    }

    fn record(&self, call: &'static str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    fn matches(&self, item: &AttributeMap, key: &AttributeMap) -> bool {
        let mut names = vec![&self.key_schema.partition_key];
        names.extend(&self.key_schema.sort_key);
        names
            .into_iter()
            .all(|name| item.get(name).is_some() && item.get(name) == key.get(name))
    }
}

/// Resolve an attribute token through the alias map.
///
/// Bare reserved words are rejected, like DynamoDB does.
fn resolve(token: &str, names: &Names) -> Result<String, StoreError> {
    if !token.starts_with('#') {
        if reserved::is_reserved(token) {
            return Err(format!("attribute name is a reserved keyword: {token}").into());
        }
        return Ok(token.to_string());
    }
    names
        .as_ref()
        .and_then(|names| names.get(token))
        .cloned()
        .ok_or_else(|| format!("unresolved attribute name {token}").into())
}

fn value(
    placeholder: &str,
    values: &Option<AttributeMap>,
) -> Result<AttributeValue, StoreError> {
    values
        .as_ref()
        .and_then(|values| values.get(placeholder))
        .cloned()
        .ok_or_else(|| format!("unresolved attribute value {placeholder}").into())
}

/// Reject names and values no expression references, like DynamoDB does.
fn check_unused(
    texts: &[&str],
    names: &Names,
    values: &Option<AttributeMap>,
) -> Result<(), StoreError> {
    if names.as_ref().is_some_and(|names| names.is_empty())
        || values.as_ref().is_some_and(|values| values.is_empty())
    {
        return Err("expression attribute maps must not be empty".into());
    }
    let referenced = |token: &String| texts.iter().any(|text| mentions(text, token));
    let unused = names
        .iter()
        .flat_map(|names| names.keys())
        .chain(values.iter().flat_map(|values| values.keys()))
        .find(|&token| !referenced(token));
    match unused {
        Some(token) => Err(format!("unused expression attribute {token}").into()),
        None => Ok(()),
    }
}

fn mentions(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(index, _)| {
        text[index + token.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Split on commas outside parentheses.
fn split_top_level(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(expression[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(expression[start..].trim());
    parts
}

fn project(
    item: &AttributeMap,
    projection: &Option<String>,
    names: &Names,
) -> Result<AttributeMap, StoreError> {
    let Some(projection) = projection else {
        return Ok(item.clone());
    };
    let mut projected = AttributeMap::new();
    for token in split_top_level(projection) {
        let name = resolve(token, names)?;
        if let Some(value) = item.get(&name) {
            projected.insert(name, value.clone());
        }
    }
    Ok(projected)
}

fn apply_update(item: &mut AttributeMap, request: &UpdateRequest) -> Result<(), StoreError> {
    let assignments = request
        .update_expression
        .strip_prefix("SET ")
        .ok_or("only SET updates are supported")?;
    let mut seen = collections::HashSet::new();
    for assignment in split_top_level(assignments) {
        let (path, operand) = assignment
            .split_once(" = ")
            .ok_or_else(|| format!("malformed assignment {assignment}"))?;
        let name = resolve(path.trim(), &request.expression_attribute_names)?;
        if !seen.insert(name.clone()) {
            return Err(format!("two document paths overlap: {name}").into());
        }
        let operand = operand.trim();
        let new_value = match operand.strip_prefix("if_not_exists(") {
            Some(arguments) => {
                let (_, placeholder) = arguments
                    .trim_end_matches(')')
                    .split_once(',')
                    .ok_or_else(|| format!("malformed operand {operand}"))?;
                match item.get(&name) {
                    Some(existing) => existing.clone(),
                    None => value(placeholder.trim(), &request.expression_attribute_values)?,
                }
            }
            None => value(operand, &request.expression_attribute_values)?,
        };
        item.insert(name, new_value);
    }
    Ok(())
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_item(&self, request: GetRequest) -> Result<Option<AttributeMap>, StoreError> {
        self.record("get_item")?;
        let projection = request.projection_expression.as_deref().unwrap_or_default();
        check_unused(&[projection], &request.expression_attribute_names, &None)?;
        let items = self.items.read().await;
        items
            .iter()
            .find(|item| self.matches(item, &request.key))
            .map(|item| {
                project(
                    item,
                    &request.projection_expression,
                    &request.expression_attribute_names,
                )
            })
            .transpose()
    }

    async fn put_item(&self, request: PutRequest) -> Result<(), StoreError> {
        self.record("put_item")?;
        let mut items = self.items.write().await;
        items.retain(|item| !self.matches(item, &request.item));
        items.push(request.item);
        Ok(())
    }

    async fn update_item(&self, request: UpdateRequest) -> Result<(), StoreError> {
        self.record("update_item")?;
        check_unused(
            &[request.update_expression.as_str()],
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;
        let mut items = self.items.write().await;
        let index = match items.iter().position(|item| self.matches(item, &request.key)) {
            Some(index) => index,
            None => {
                items.push(request.key.clone());
                items.len() - 1
            }
        };
        let mut updated = items[index].clone();
        apply_update(&mut updated, &request)?;
        items[index] = updated;
        Ok(())
    }

    async fn delete_item(&self, request: DeleteRequest) -> Result<(), StoreError> {
        self.record("delete_item")?;
        self.items
            .write()
            .await
            .retain(|item| !self.matches(item, &request.key));
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<AttributeMap>, StoreError> {
        self.record("query")?;
        self.indexes.lock().unwrap().push(request.index.clone());
        let projection = request.projection_expression.as_deref().unwrap_or_default();
        check_unused(
            &[request.key_condition_expression.as_str(), projection],
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;
        let mut conditions = Vec::new();
        for condition in request.key_condition_expression.split(" AND ") {
            let (path, placeholder) = condition
                .split_once(" = ")
                .ok_or_else(|| format!("unsupported key condition {condition}"))?;
            let name = resolve(path.trim(), &request.expression_attribute_names)?;
            let expected = value(placeholder.trim(), &request.expression_attribute_values)?;
            conditions.push((name, expected));
        }
        let items = self.items.read().await;
        items
            .iter()
            .filter(|item| {
                conditions
                    .iter()
                    .all(|(name, expected)| item.get(name) == Some(expected))
            })
            .map(|item| {
                project(
                    item,
                    &request.projection_expression,
                    &request.expression_attribute_names,
                )
            })
            .collect()
    }

    async fn scan(&self, request: ScanRequest) -> Result<Vec<AttributeMap>, StoreError> {
        self.record("scan")?;
        let projection = request.projection_expression.as_deref().unwrap_or_default();
        check_unused(&[projection], &request.expression_attribute_names, &None)?;
        let items = self.items.read().await;
        items
            .iter()
            .map(|item| {
                project(
                    item,
                    &request.projection_expression,
                    &request.expression_attribute_names,
                )
            })
            .collect()
    }

    async fn batch_get_item(
        &self,
        request: BatchGetRequest,
    ) -> Result<Vec<AttributeMap>, StoreError> {
        self.record("batch_get_item")?;
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|item| request.keys.iter().any(|key| self.matches(item, key)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::plain("a = :a, b = :b", vec!["a = :a", "b = :b"])]
    #[case::function(
        "a = :a, c = if_not_exists(c, :c)",
        vec!["a = :a", "c = if_not_exists(c, :c)"]
    )]
    fn test_split_top_level(#[case] expression: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_top_level(expression), expected);
    }

    #[rstest]
    #[case::plain("surname", None, Ok("surname"))]
    #[case::aliased("#status", Some(("#status", "status")), Ok("status"))]
    #[case::bare_reserved("status", None, Err(()))]
    #[case::unresolved("#status", None, Err(()))]
    fn test_resolve(
        #[case] token: &str,
        #[case] alias: Option<(&str, &str)>,
        #[case] expected: Result<&str, ()>,
    ) {
        let names = alias.map(|(alias, name)| {
            collections::HashMap::from([(alias.to_string(), name.to_string())])
        });
        let actual = resolve(token, &names).map_err(|_| ());
        assert_eq!(actual, expected.map(str::to_string));
    }

    #[rstest]
    #[case::exact("#role = :role", ":role", true)]
    #[case::prefix_only("birthYearMonth = :birthYearMonth", ":birthYear", false)]
    #[case::absent("a = :a", "#b", false)]
    fn test_mentions(#[case] text: &str, #[case] token: &str, #[case] expected: bool) {
        assert_eq!(mentions(text, token), expected);
    }
}
