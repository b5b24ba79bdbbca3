//! Error types for pgfluent

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for pgfluent operations
pub type DbResult<T> = Result<T, DbError>;

/// Stable error codes surfaced in [`ErrorInfo::code`].
pub mod codes {
    /// The handle was built without a usable driver (missing or broken connection string).
    pub const CLIENT_NOT_INITIALIZED: &str = "CLIENT_NOT_INITIALIZED";
    /// The connection dropped or timed out mid-statement. Safe to retry.
    pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
    /// An UPDATE/DELETE was requested without any WHERE condition.
    pub const MISSING_WHERE_CLAUSE: &str = "MISSING_WHERE_CLAUSE";
    /// `single()` found no rows (PostgREST-compatible code).
    pub const NO_ROWS: &str = "PGRST116";
    /// The builder state could not be compiled into a valid statement.
    pub const INVALID_QUERY: &str = "INVALID_QUERY";
    /// A driver error that carried no SQLSTATE.
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// Fixed hint attached to every connection error.
pub const CONNECTION_RETRY_HINT: &str =
    "The database connection was interrupted or timed out; the request can be retried.";

/// The raw shape of an error reported by the underlying driver.
///
/// This is what the classifier inspects. Driver adapters convert their native errors into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverError {
    /// Human readable message as reported by the driver.
    pub message: String,
    /// SQLSTATE (or driver specific) code, if any.
    pub code: Option<String>,
    /// Server supplied detail.
    pub detail: Option<String>,
    /// Server supplied hint.
    pub hint: Option<String>,
    /// The driver reported that the connection is closed.
    pub closed: bool,
    /// The driver handle itself is unusable (e.g. a closed pool).
    pub unavailable: bool,
    /// Raised while encoding a parameter or decoding a column, not by the transport.
    pub conversion: bool,
}

impl DriverError {
    /// Create a driver error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach a SQLSTATE code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach server detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach server hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Mark the connection as closed.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Mark the driver handle as unusable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Mark as a value conversion failure.
    pub fn conversion(mut self) -> Self {
        self.conversion = true;
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<tokio_postgres::Error> for DriverError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            return Self {
                message: db_err.message().to_string(),
                code: Some(db_err.code().code().to_string()),
                detail: db_err.detail().map(str::to_string),
                hint: db_err.hint().map(str::to_string),
                closed: false,
                unavailable: false,
                conversion: false,
            };
        }
        let message = err.to_string();
        Self {
            conversion: is_conversion_message(&message),
            closed: err.is_closed(),
            message,
            ..Self::default()
        }
    }
}

/// tokio-postgres prefixes parameter and column conversion failures with fixed text.
fn is_conversion_message(message: &str) -> bool {
    const PREFIXES: &[&str] = &["error serializing parameter", "error deserializing column"];
    PREFIXES.iter().any(|p| message.starts_with(p))
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DriverError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        use deadpool_postgres::PoolError;

        match err {
            PoolError::Backend(e) => Self::from(e),
            PoolError::Timeout(kind) => Self::new(format!("connection pool timeout ({kind:?})")),
            PoolError::Closed => Self::new("connection pool is closed").unavailable(),
            PoolError::NoRuntimeSpecified => {
                Self::new("connection pool has no async runtime").unavailable()
            }
            other => Self::new(other.to_string()),
        }
    }
}

/// Error types for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// No driver is available (missing connection string, failed pool creation, closed pool).
    #[error("Database client not initialized: {0}")]
    ClientNotInitialized(String),

    /// Transient connection failure; callers may retry.
    #[error("Connection error: {0}")]
    Connection(DriverError),

    /// A write that would touch every row was refused.
    #[error("Missing WHERE clause: {0}")]
    MissingWhereClause(String),

    /// `single()` found no rows
    #[error("No rows returned")]
    NoRows,

    /// The builder could not produce a valid statement.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Any other driver error, passed through untouched.
    #[error("{0}")]
    Driver(DriverError),
}

impl DbError {
    /// Create an invalid query error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create a missing-WHERE error
    pub fn missing_where(message: impl Into<String>) -> Self {
        Self::MissingWhereClause(message.into())
    }

    /// Stable error code for this error.
    pub fn code(&self) -> &str {
        match self {
            Self::ClientNotInitialized(_) => codes::CLIENT_NOT_INITIALIZED,
            Self::Connection(_) => codes::CONNECTION_ERROR,
            Self::MissingWhereClause(_) => codes::MISSING_WHERE_CLAUSE,
            Self::NoRows => codes::NO_ROWS,
            Self::InvalidQuery(_) => codes::INVALID_QUERY,
            Self::Driver(e) => e.code.as_deref().unwrap_or(codes::UNKNOWN),
        }
    }

    /// Server detail, for driver errors.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Driver(e) | Self::Connection(e) => e.detail.as_deref(),
            _ => None,
        }
    }

    /// Hint for the caller. Connection errors always carry the retry hint.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Connection(_) => Some(CONNECTION_RETRY_HINT),
            Self::Driver(e) => e.hint.as_deref(),
            _ => None,
        }
    }

    /// Check if the caller should retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a no-rows error
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Driver(e) if e.code.as_deref() == Some("23505"))
    }

    /// Flatten into the serializable wire shape.
    ///
    /// `include_original` attaches the underlying driver error text for diagnostics; keep it off
    /// in production.
    pub fn to_info(&self, include_original: bool) -> ErrorInfo {
        let original_error = match self {
            Self::Driver(e) | Self::Connection(e) if include_original => Some(e.to_string()),
            _ => None,
        };
        let message = match self {
            Self::Driver(e) => e.message.clone(),
            other => other.to_string(),
        };
        ErrorInfo {
            message,
            code: self.code().to_string(),
            hint: self.hint().map(str::to_string),
            detail: self.detail().map(str::to_string),
            original_error,
        }
    }
}

/// Uniformly shaped error object handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DbError::ClientNotInitialized("x".into()).code(),
            "CLIENT_NOT_INITIALIZED"
        );
        assert_eq!(DbError::NoRows.code(), "PGRST116");
        assert_eq!(DbError::missing_where("users").code(), "MISSING_WHERE_CLAUSE");
        assert_eq!(DbError::invalid("bad").code(), "INVALID_QUERY");
        assert_eq!(DbError::Driver(DriverError::new("boom")).code(), "UNKNOWN");
    }

    #[test]
    fn driver_error_passes_fields_through() {
        let err = DbError::Driver(
            DriverError::new("duplicate key value violates unique constraint \"users_email_key\"")
                .with_code("23505")
                .with_detail("Key (email)=(a@b.c) already exists.")
                .with_hint("use another email"),
        );
        let info = err.to_info(false);
        assert_eq!(info.code, "23505");
        assert_eq!(
            info.message,
            "duplicate key value violates unique constraint \"users_email_key\""
        );
        assert_eq!(info.detail.as_deref(), Some("Key (email)=(a@b.c) already exists."));
        assert_eq!(info.hint.as_deref(), Some("use another email"));
        assert!(info.original_error.is_none());
        assert!(err.is_unique_violation());
    }

    #[test]
    fn original_error_only_when_requested() {
        let err = DbError::Connection(DriverError::new("Connection terminated unexpectedly"));
        assert!(err.to_info(false).original_error.is_none());
        assert_eq!(
            err.to_info(true).original_error.as_deref(),
            Some("Connection terminated unexpectedly")
        );
        assert_eq!(err.to_info(false).hint.as_deref(), Some(CONNECTION_RETRY_HINT));
        assert!(err.is_retryable());
    }

    #[test]
    fn driver_conversion_prefixes_are_recognised() {
        assert!(is_conversion_message(
            "error serializing parameter 0: invalid boolean literal \"timeout\""
        ));
        assert!(is_conversion_message("error deserializing column 2: value out of range"));
        assert!(!is_conversion_message("error communicating with the server: Broken pipe"));
        assert!(!is_conversion_message("connection closed"));
    }

    #[test]
    fn info_serializes_camel_case_and_skips_empty() {
        let info = DbError::NoRows.to_info(true);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "No rows returned", "code": "PGRST116" })
        );

        let info = DbError::Driver(DriverError::new("x").with_code("42P01")).to_info(true);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["originalError"], "x (42P01)");
    }
}
