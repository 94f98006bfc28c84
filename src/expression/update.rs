use crate::common::{self, alias::Aliases, item, key::KeySchema};

use serde_dynamo::{Result, to_attribute_value};
use serde_json::Value;
use std::collections;

/// Fields of `item` that an update may assign: everything but the key and `createdAt`.
fn assignable<'a>(item: &'a item::Item, key_schema: &'a KeySchema) -> impl Iterator<Item = &'a str> {
    item.keys()
        .map(String::as_str)
        .filter(|field| !key_schema.contains(field) && *field != item::CREATED_AT)
}

/// The `createdAt` clause closing every generated update.
///
/// It writes the creation time only the first time a key is written.
pub fn created_at_clause(aliases: &Aliases) -> String {
    let created_at = aliases.resolve(item::CREATED_AT);
    format!(
        "{created_at} = if_not_exists({created_at}, :{})",
        item::CREATED_AT
    )
}

/// Build the assignment list of an update expression, without the leading `SET`.
///
/// Every field except the key attributes and `createdAt` is assigned from its own placeholder,
/// then the `createdAt` clause is appended.
pub fn update_expression(item: &item::Item, key_schema: &KeySchema, aliases: &Aliases) -> String {
    assignable(item, key_schema)
        .map(|field| format!("{} = :{field}", aliases.resolve(field)))
        .chain([created_at_clause(aliases)])
        .collect::<Vec<_>>()
        .join(", ")
}

/// Alias entries for the fields of `item`, or `None` when no field is aliased.
pub fn attribute_names(
    item: &item::Item,
    aliases: &Aliases,
) -> Option<collections::HashMap<String, String>> {
    let names = aliases.names_for(item.keys().map(String::as_str));
    if names.is_empty() { None } else { Some(names) }
}

/// Placeholder values for an update of `item`.
///
/// Key attributes are skipped. `:createdAt` is always present and defaults to `now` when the
/// record has no `createdAt` or a null one.
pub fn update_values(
    item: &item::Item,
    key_schema: &KeySchema,
    now: i64,
) -> Result<collections::HashMap<String, aws_sdk_dynamodb::types::AttributeValue>> {
    let mut values = collections::HashMap::with_capacity(item.len() + 1);
    for (field, value) in item.iter().filter(|(field, _)| !key_schema.contains(field)) {
        values.insert(format!(":{field}"), to_attribute_value(value)?);
    }
    if item.get(item::CREATED_AT).is_none_or(Value::is_null) {
        let created_at_placeholder = format!(":{}", item::CREATED_AT);
        values.insert(created_at_placeholder, to_attribute_value(Value::from(now))?);
    }
    Ok(values)
}

/// The expression, names and values of an update of `item` combined.
pub fn assignments(
    item: &item::Item,
    key_schema: &KeySchema,
    aliases: &Aliases,
    now: i64,
) -> Result<common::ExpressionInput> {
    let expression_attribute_values = update_values(item, key_schema, now)?;
    let mut fields: Vec<&str> = assignable(item, key_schema).collect();
    fields.push(item::CREATED_AT);
    Ok(common::ExpressionInput {
        expression: update_expression(item, key_schema, aliases),
        expression_attribute_names: aliases.names_for(fields),
        expression_attribute_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types::AttributeValue;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> item::Item {
        item::to_item(&value).unwrap()
    }

    #[rstest]
    #[case::plain(
        json!({"id": "1", "firstName": "Mike"}),
        "firstName = :firstName, createdAt = if_not_exists(createdAt, :createdAt)"
    )]
    #[case::reserved(
        json!({"id": "1", "role": "admin", "surname": "Doe"}),
        "#role = :role, surname = :surname, createdAt = if_not_exists(createdAt, :createdAt)"
    )]
    #[case::keys_and_created_at_skipped(
        json!({"id": "1", "sk": 2, "createdAt": 5, "updatedAt": 6}),
        "updatedAt = :updatedAt, createdAt = if_not_exists(createdAt, :createdAt)"
    )]
    #[case::only_keys(
        json!({"id": "1"}),
        "createdAt = if_not_exists(createdAt, :createdAt)"
    )]
    fn test_update_expression(#[case] value: Value, #[case] expected: &str) {
        let aliases = Aliases::new(["id", "firstName", "surname", "role"]);
        let key_schema = KeySchema::composite("id", "sk");
        let actual = update_expression(&record(value), &key_schema, &aliases);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_update_expression_never_references_bare_reserved_field() {
        let aliases = Aliases::new(["role", "name", "status"]);
        let item = record(json!({"role": "a", "name": "b", "status": "c"}));
        let expression = update_expression(&item, &KeySchema::new("id"), &aliases);
        assert_eq!(
            expression,
            "#role = :role, #name = :name, #status = :status, \
             createdAt = if_not_exists(createdAt, :createdAt)"
        );
    }

    #[rstest]
    #[case::none_aliased(json!({"id": "1", "firstName": "Mike"}), None)]
    #[case::aliased(
        json!({"id": "1", "role": "admin"}),
        Some(collections::HashMap::from([("#role".to_string(), "role".to_string())]))
    )]
    fn test_attribute_names(
        #[case] value: Value,
        #[case] expected: Option<collections::HashMap<String, String>>,
    ) {
        let aliases = Aliases::new(["id", "firstName", "role"]);
        assert_eq!(attribute_names(&record(value), &aliases), expected);
    }

    #[rstest]
    #[case::created_at_defaulted(
        json!({"id": "1", "firstName": "Mike"}),
        collections::HashMap::from([
            (":firstName".to_string(), AttributeValue::S("Mike".to_string())),
            (":createdAt".to_string(), AttributeValue::N("42".to_string())),
        ])
    )]
    #[case::created_at_supplied(
        json!({"id": "1", "createdAt": 7}),
        collections::HashMap::from([
            (":createdAt".to_string(), AttributeValue::N("7".to_string())),
        ])
    )]
    #[case::null_created_at(
        json!({"id": "1", "createdAt": null}),
        collections::HashMap::from([
            (":createdAt".to_string(), AttributeValue::N("42".to_string())),
        ])
    )]
    #[case::null_kept(
        json!({"id": "1", "email": null}),
        collections::HashMap::from([
            (":email".to_string(), AttributeValue::Null(true)),
            (":createdAt".to_string(), AttributeValue::N("42".to_string())),
        ])
    )]
    fn test_update_values(
        #[case] value: Value,
        #[case] expected: collections::HashMap<String, AttributeValue>,
    ) {
        let actual = update_values(&record(value), &KeySchema::new("id"), 42).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_assignments() {
        let aliases = Aliases::new(["id", "role"]);
        let item = record(json!({"id": "1", "role": "admin"}));
        let actual = assignments(&item, &KeySchema::new("id"), &aliases, 42).unwrap();
        let expected = common::ExpressionInput {
            expression: "#role = :role, createdAt = if_not_exists(createdAt, :createdAt)"
                .to_string(),
            expression_attribute_names: collections::HashMap::from([(
                "#role".to_string(),
                "role".to_string(),
            )]),
            expression_attribute_values: collections::HashMap::from([
                (":role".to_string(), AttributeValue::S("admin".to_string())),
                (":createdAt".to_string(), AttributeValue::N("42".to_string())),
            ]),
        };
        assert_eq!(actual, expected);
    }
}
