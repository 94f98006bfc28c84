use crate::common::{self, alias::Aliases, item};

use indexmap::IndexSet;
use std::{collections, sync};

/// Build a projection expression for `fields`.
///
/// Fields are emitted in request order through their alias when they have one; reserved fields
/// missing from `aliases` are escaped too. Fields outside
/// `known` are dropped (an empty `known` set accepts every field), duplicates are dropped, and
/// the bookkeeping attributes are always appended last.
pub fn projection_expression<S: AsRef<str>>(
    fields: &[S],
    known: &IndexSet<String>,
    aliases: &Aliases,
) -> common::ExpressionInput {
    let mut selected: IndexSet<&str> = fields
        .iter()
        .map(AsRef::as_ref)
        .filter(|field| !item::BOOKKEEPING_FIELDS.contains(field))
        .filter(|field| known.is_empty() || known.contains(*field))
        .collect();
    selected.extend(item::BOOKKEEPING_FIELDS);
    let aliases = aliases.with_fields(selected.iter());
    let expression = selected
        .iter()
        .map(|field| aliases.resolve(field))
        .collect::<Vec<_>>()
        .join(", ");
    common::ExpressionInput {
        expression,
        expression_attribute_names: aliases.names_for(selected.iter().copied()),
        ..Default::default()
    }
}

/// Projection descriptor: the fields a repository reads by default.
///
/// Per-call overrides are memoized by the exact requested field list; the declared fields
/// never change after construction, so cached entries never go stale.
#[derive(Debug, Default)]
pub struct Projection {
    fields: IndexSet<String>,
    aliases: Aliases,
    default: Option<common::ExpressionInput>,
    cache: sync::RwLock<collections::HashMap<Vec<String>, common::ExpressionInput>>,
}

impl Projection {
    /// Declare the projected fields.
    ///
    /// An empty declaration projects nothing by default, so reads return whole items.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: IndexSet<String> = fields.into_iter().map(Into::into).collect();
        let aliases = Aliases::new(&fields);
        let default = if fields.is_empty() {
            None
        } else {
            let declared: Vec<&str> = fields.iter().map(String::as_str).collect();
            Some(projection_expression(&declared, &fields, &aliases))
        };
        Self {
            fields,
            aliases,
            default,
            cache: Default::default(),
        }
    }

    /// The declared fields, without bookkeeping attributes.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Reserved-word aliases of the declared fields.
    pub fn aliases(&self) -> &Aliases {
        &self.aliases
    }

    /// The default projection, `None` when no field was declared.
    pub fn default_expression(&self) -> Option<&common::ExpressionInput> {
        self.default.as_ref()
    }

    /// The projection for a read: `fields` when non-empty, the default otherwise.
    pub fn resolve<S: AsRef<str>>(&self, fields: Option<&[S]>) -> Option<common::ExpressionInput> {
        match fields {
            Some(fields) if !fields.is_empty() => Some(self.select(fields)),
            _ => self.default.clone(),
        }
    }

    /// The projection for exactly `fields`, memoized.
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> common::ExpressionInput {
        let key: Vec<String> = fields.iter().map(|field| field.as_ref().to_string()).collect();
        let cached = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&key).cloned());
        if let Some(projection) = cached {
            return projection;
        }
        let projection = projection_expression(fields, &self.fields, &self.aliases);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, projection.clone());
        }
        projection
    }
}
