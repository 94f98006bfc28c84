//! Expression builder.
//!
//! Pure functions translating records into DynamoDB expression text, attribute name aliases and
//! attribute value placeholders:
//! - Projection expressions for reads, memoized per requested field list
//! - `SET` assignment lists for partial updates, with the `createdAt` first-write clause
//! - Placeholder values for query conditions
//! - Rewriting of caller-authored update fragments

/// Projection expressions.
pub mod projection;

/// Caller-authored update fragments.
pub mod rewrite;

/// Update expressions and their placeholders.
pub mod update;

/// Placeholder values for conditions.
pub mod values;
