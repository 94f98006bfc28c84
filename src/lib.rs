#![deny(missing_docs)]
#![deny(warnings)]

//! # DynamoDB Repo
//!
//! A typed repository over a single Amazon DynamoDB table.
//!
//! ## Overview
//!
//! Hand-written DynamoDB expressions are error prone: reserved attribute names must be escaped,
//! every placeholder must be bound, and unused aliases make the request fail. This library
//! derives those expressions from the records themselves:
//! - Projection expressions from a declared field list, with reserved words aliased
//! - `SET` update expressions from partial records, never overwriting the creation time
//! - Rewriting of caller-authored update fragments so they can be mixed with generated ones
//! - `createdAt` and `updatedAt` bookkeeping on every write
//! - A per-repository upsert hook validating and deriving fields before any write
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_repo::{
//!     common::{item::{self, TimestampPolicy}, key::KeySchema},
//!     repository::{ExpressionUpdate, Repository, config::RepositoryConfig},
//! };
//! use serde_json::{Value, json};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
//! let config = RepositoryConfig::new("user", KeySchema::new("id"))
//!     .with_projection(["id", "firstName", "role"]);
//! let users: Repository<Value> = Repository::new(client, config);
//! users
//!     .add_item(&json!({"id": "1", "firstName": "John", "role": "user"}), TimestampPolicy::Replace)
//!     .await?;
//! // Sends "SET firstName = :firstName, updatedAt = :updatedAt,
//! //   createdAt = if_not_exists(createdAt, :createdAt), #role = :role"
//! let update = ExpressionUpdate {
//!     update_expression: "role = :role".to_string(),
//!     values: item::to_item(&json!({"role": "admin"}))?,
//!     item: item::to_item(&json!({"id": "1", "firstName": "John"}))?,
//!     timestamp: TimestampPolicy::Replace,
//!     ..Default::default()
//! };
//! users.update_expression_item(&json!({"id": "1"}), update).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Records, keys, reserved words and aliases
//! - [`mod@expression`] - Projection and update expression builders
//! - [`mod@repository`] - The repository and its configuration
//! - [`mod@store`] - The remote store seam
//! - [`mod@error`] - Error types

/// Common types for records, keys, reserved words and attribute aliases.
pub mod common;

/// Errors returned by repository operations.
pub mod error;

/// Expression builders for projections and updates.
///
/// This module provides builders for:
/// - Projection expressions of reads
/// - `SET` update expressions of partial records
/// - Placeholder values of conditions
/// - Rewriting caller-authored update fragments
pub mod expression;

/// The typed repository.
///
/// This module provides operations for:
/// - Finding one record by key, searching by key condition, listing and batch reading
/// - Adding whole records
/// - Updating records from partial records or update expressions
/// - Deleting records by key
pub mod repository;

/// The remote store seam.
pub mod store;

pub use error::{Error, Result, ValidationError};
pub use repository::Repository;
