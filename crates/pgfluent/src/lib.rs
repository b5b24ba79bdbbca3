//! # pgfluent
//!
//! A fluent, Postgres-only query builder for serverless drivers.
//!
//! ## Features
//!
//! - **Fluent builder**: `db.table(..)` → chain filters, order and pagination → one terminal call
//! - **Segment binding**: positional SQL is split into literal/value segments for template-style
//!   drivers; tokio-postgres and deadpool pools are supported out of the box
//! - **Safe by construction**: every identifier is quoted, every value is bound (including
//!   `LIMIT`/`OFFSET`), UPDATE/DELETE require a WHERE condition
//! - **Uniform errors**: driver failures are classified into `CLIENT_NOT_INITIALIZED`,
//!   `CONNECTION_ERROR` (retryable) or a SQLSTATE passthrough, and flatten into a serializable
//!   `{data, error}` response
//!
//! ## Example
//!
//! ```ignore
//! use pgfluent::{Database, DbConfig, row};
//!
//! let db = Database::connect(&DbConfig::from_env());
//!
//! // SELECT
//! let videos = db
//!     .table("videos")
//!     .eq("isPublished", true)
//!     .contains_case_insensitive("tags", "pilates")
//!     .order("createdAt", false)
//!     .range(0, 49)
//!     .execute()
//!     .await?;
//!
//! // INSERT
//! let stored = db
//!     .table("videos")
//!     .insert(row! { "title" => "Core basics", "tags" => vec!["core"] })
//!     .await?;
//!
//! // UPDATE (requires a condition)
//! db.table("videos")
//!     .eq("id", 42)
//!     .update(row! { "isPublished" => false })
//!     .await?;
//!
//! // Helpers
//! pgfluent::remove(&db, "videos", row! { "id" => 42 }).await?;
//! ```

pub mod binder;
pub mod builder;
pub mod classify;
pub mod client;
pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod helpers;
pub mod ident;
pub mod query;
pub mod response;
pub mod row;
pub mod value;

pub use binder::{BoundSegment, BoundStatement, bind};
pub use builder::{OrderSpec, QueryBuilder};
pub use classify::classify;
pub use client::SegmentClient;
pub use condition::{Condition, Op};
pub use config::DbConfig;
pub use database::Database;
pub use error::{DbError, DbResult, DriverError, ErrorInfo, codes};
pub use helpers::{insert, query, remove, update};
pub use ident::{Ident, IntoIdent};
pub use query::{CompiledQuery, StatementKind};
pub use response::Response;
pub use value::{RowMap, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::create_pool;

/// Pooled handle type created by [`Database::connect`].
#[cfg(feature = "pool")]
pub type PgDatabase = Database<deadpool_postgres::Pool>;

// Re-export driver crates so callers can name their types without a direct dependency
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
