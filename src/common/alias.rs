use crate::common::reserved;

use indexmap::IndexMap;
use std::collections;

/// Alias placeholder for an attribute name.
pub(crate) fn alias_of(name: &str) -> String {
    format!("#{name}")
}

/// Reserved-word alias map.
///
/// Built once from the declared fields of a repository: every declared field that collides
/// with a reserved word is referenced through `#field` in every expression, every other field
/// is always referenced bare. Writes touching undeclared fields extend a copy of the map with
/// [`with_fields`](Self::with_fields), so an undeclared reserved field is escaped the same way
/// in generated assignments as in caller-authored fragments.
///
/// ```rust
/// use dynamodb_repo::common::alias::Aliases;
///
/// let aliases = Aliases::new(["id", "role"]);
/// assert_eq!(aliases.resolve("role"), "#role");
/// assert_eq!(aliases.resolve("id"), "id");
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Aliases(IndexMap<String, String>);

impl Aliases {
    /// Alias the reserved words among `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = fields
            .into_iter()
            .filter(|field| reserved::is_reserved(field.as_ref()))
            .map(|field| (field.as_ref().to_string(), alias_of(field.as_ref())))
            .collect();
        Self(aliases)
    }

    /// A copy also aliasing the reserved words among `fields`.
    pub fn with_fields<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut aliases = self.clone();
        aliases.0.extend(Self::new(fields).0);
        aliases
    }

    /// The alias of `field`, if it has one.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// The token to use for `field` in an expression.
    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.get(field).unwrap_or(field)
    }

    /// Whether no declared field needed an alias.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `ExpressionAttributeNames` entries for the aliased fields among `fields`.
    pub fn names_for<'a, I>(&self, fields: I) -> collections::HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields
            .into_iter()
            .filter_map(|field| {
                self.get(field)
                    .map(|alias| (alias.to_string(), field.to_string()))
            })
            .collect()
    }
}
