//! The injected database handle.

use crate::builder::QueryBuilder;
use crate::client::SegmentClient;
use crate::config::{DbConfig, ENV_DATABASE_URL};
use crate::error::{DbError, DbResult};
use crate::query::{self, CompiledQuery, StatementKind};
use crate::response::Response;
use crate::value::RowMap;

enum Handle<C> {
    Ready(C),
    Uninitialized(String),
}

/// Entry point for building and running statements against one driver.
///
/// A `Database` is cheap to share by reference; builders borrow it for the duration of a
/// single query. A handle created without a usable driver still works as a value: every
/// operation on it fails with `CLIENT_NOT_INITIALIZED`.
pub struct Database<C> {
    handle: Handle<C>,
    config: DbConfig,
}

impl<C: SegmentClient> Database<C> {
    /// Wrap a ready driver with the default configuration.
    pub fn new(client: C) -> Self {
        Self {
            handle: Handle::Ready(client),
            config: DbConfig::default(),
        }
    }

    /// A handle with no driver. `reason` ends up in every error it returns.
    pub fn uninitialized(reason: impl Into<String>) -> Self {
        Self {
            handle: Handle::Uninitialized(reason.into()),
            config: DbConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: DbConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.handle, Handle::Ready(_))
    }

    /// The underlying driver, or `CLIENT_NOT_INITIALIZED`.
    pub fn client(&self) -> DbResult<&C> {
        match &self.handle {
            Handle::Ready(client) => Ok(client),
            Handle::Uninitialized(reason) => Err(DbError::ClientNotInitialized(reason.clone())),
        }
    }

    /// Start a query on `table`.
    ///
    /// An invalid table name is reported by the terminal call.
    pub fn table(&self, table: &str) -> QueryBuilder<'_, C> {
        QueryBuilder::new(self, table)
    }

    /// Convert a result into the `{data, error}` shape using this handle's error settings.
    pub fn respond<T>(&self, result: DbResult<T>) -> Response<T> {
        Response::from_result(result, self.config.include_original_errors)
    }

    pub(crate) async fn run(
        &self,
        kind: StatementKind,
        compiled: &CompiledQuery,
    ) -> DbResult<Vec<RowMap>> {
        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                query::log_failure(kind, &err, &compiled.sql, self.config.max_logged_sql_length);
                return Err(err);
            }
        };
        query::run(client, kind, compiled, self.config.max_logged_sql_length).await
    }
}

#[cfg(feature = "pool")]
impl Database<deadpool_postgres::Pool> {
    /// Build a pooled handle from `config`.
    ///
    /// Never fails: a missing or unparsable connection string yields an uninitialized handle
    /// whose errors carry the reason.
    pub fn connect(config: &DbConfig) -> Self {
        let handle = match config.database_url.as_deref() {
            None => {
                let reason = format!("{ENV_DATABASE_URL} is not set");
                tracing::warn!(target: "pgfluent", %reason, "database client not initialized");
                Handle::Uninitialized(reason)
            }
            Some(url) => match crate::pool::create_pool(url, config.pool_max_size) {
                Ok(pool) => {
                    tracing::debug!(
                        target: "pgfluent",
                        max_size = config.pool_max_size,
                        "connection pool created"
                    );
                    Handle::Ready(pool)
                }
                Err(err) => {
                    let reason = match err {
                        DbError::ClientNotInitialized(reason) => reason,
                        other => other.to_string(),
                    };
                    tracing::error!(target: "pgfluent", %reason, "database client not initialized");
                    Handle::Uninitialized(reason)
                }
            },
        };
        Self {
            handle,
            config: config.clone(),
        }
    }

    /// [`DbConfig::from_env`] followed by [`Database::connect`].
    pub fn from_env() -> Self {
        Self::connect(&DbConfig::from_env())
    }
}
