use crate::common::{alias, item};

use std::collections;

/// Clause keywords of the update grammar; never attribute names.
const CLAUSE_KEYWORDS: [&str; 4] = ["SET", "REMOVE", "ADD", "DELETE"];

/// A caller-authored update fragment after rewriting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rewrite {
    /// The fragment with reserved attribute names escaped.
    pub expression: String,
    /// The fields of the record the fragment does not already assign.
    pub residual: item::Item,
    /// Alias entries for every `#name` token of the rewritten fragment.
    pub expression_attribute_names: collections::HashMap<String, String>,
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Maximal runs of word characters with their byte offsets.
fn words(expression: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (index, c) in expression.char_indices() {
        match (is_word(c), start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                words.push((begin, &expression[begin..index]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        words.push((begin, &expression[begin..]));
    }
    words
}

/// Attribute names written as `#name` in `expression`.
pub fn escaped_names(expression: &str) -> impl Iterator<Item = &str> {
    words(expression)
        .into_iter()
        .filter(move |(start, _)| expression[..*start].ends_with('#'))
        .map(|(_, word)| word)
}

/// Rewrite a caller-authored update fragment against the record it accompanies.
///
/// Word tokens preceded by `:` are value placeholders and are left alone. Every other attribute
/// name token marks its field as already assigned, so the field is removed from the residual
/// record, and reserved names are escaped to `#name`. Tokens already escaped, numbers,
/// function names and clause keywords are never escaped, which makes the rewrite idempotent.
///
/// ```rust
/// use dynamodb_repo::{common::{item, reserved}, expression::rewrite};
/// use serde_json::json;
///
/// let record = item::to_item(&json!({"role": "admin", "surname": "Doe"})).unwrap();
/// let rewrite = rewrite::rewrite("role = :role", &record, reserved::is_reserved);
/// assert_eq!(rewrite.expression, "#role = :role");
/// assert_eq!(rewrite.residual.keys().collect::<Vec<_>>(), ["surname"]);
/// ```
pub fn rewrite<F>(expression: &str, item: &item::Item, is_reserved: F) -> Rewrite
where
    F: Fn(&str) -> bool,
{
    let mut rewritten = String::with_capacity(expression.len());
    let mut expression_attribute_names = collections::HashMap::new();
    let mut assigned = collections::HashSet::new();
    let mut copied = 0;
    for (start, word) in words(expression) {
        let end = start + word.len();
        match expression[..start].chars().next_back() {
            Some(':') => continue,
            Some('#') => {
                assigned.insert(word);
                expression_attribute_names.insert(alias::alias_of(word), word.to_string());
                continue;
            }
            _ => {}
        }
        let is_number = word.starts_with(|c: char| c.is_ascii_digit());
        let is_function = expression[end..].trim_start().starts_with('(');
        let is_keyword = CLAUSE_KEYWORDS
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(word));
        if is_number || is_function || is_keyword {
            continue;
        }
        assigned.insert(word);
        if is_reserved(word) {
            let alias = alias::alias_of(word);
            rewritten.push_str(&expression[copied..start]);
            rewritten.push_str(&alias);
            copied = end;
            expression_attribute_names.insert(alias, word.to_string());
        }
    }
    rewritten.push_str(&expression[copied..]);
    let residual = item
        .iter()
        .filter(|(field, _)| !assigned.contains(field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    Rewrite {
        expression: rewritten,
        residual,
        expression_attribute_names,
    }
}
