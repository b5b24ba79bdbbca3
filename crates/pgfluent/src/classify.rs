//! Mapping raw driver failures onto [`DbError`].
//!
//! Order of checks:
//! 1. an unusable driver handle becomes [`DbError::ClientNotInitialized`];
//! 2. connection failures become [`DbError::Connection`];
//! 3. anything else is passed through as [`DbError::Driver`].
//!
//! Connection failures are decided by SQLSTATE when the driver reports one (class `08`,
//! `57P01`..`57P03`). Without a SQLSTATE the message is matched against a short list of
//! substrings. That fallback is best-effort: it can misfire on unusual driver wording. It never
//! applies to conversion failures, whose messages carry column names and caller data.

use crate::error::{DbError, DriverError};

const CONNECTION_MARKERS: &[&str] = &["connection", "terminated", "timeout", "timed out", "closed"];

/// Classify a driver error.
pub fn classify(err: DriverError) -> DbError {
    if err.unavailable {
        return DbError::ClientNotInitialized(err.message);
    }
    if is_connection_failure(&err) {
        return DbError::Connection(err);
    }
    DbError::Driver(err)
}

/// Whether a SQLSTATE denotes a lost or refused connection.
pub fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

fn is_connection_failure(err: &DriverError) -> bool {
    if err.closed {
        return true;
    }
    if err.conversion {
        return false;
    }
    match err.code.as_deref() {
        Some(code) => is_connection_sqlstate(code),
        None => {
            let message = err.message.to_ascii_lowercase();
            CONNECTION_MARKERS.iter().any(|m| message.contains(m))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CONNECTION_RETRY_HINT;

    #[test]
    fn terminated_connection_is_connection_error() {
        let err = classify(DriverError::new("Connection terminated unexpectedly"));
        assert_eq!(err.code(), "CONNECTION_ERROR");
        assert_eq!(err.hint(), Some(CONNECTION_RETRY_HINT));
        assert!(err.is_retryable());
    }

    #[test]
    fn substring_match_ignores_case() {
        for msg in ["Query read TIMEOUT", "socket Timed Out", "pool CLOSED", "server terminated"] {
            assert_eq!(classify(DriverError::new(msg)).code(), "CONNECTION_ERROR", "{msg}");
        }
    }

    #[test]
    fn sqlstate_wins_over_message() {
        // The message mentions "connection" but the SQLSTATE is a constraint violation.
        let err = classify(
            DriverError::new("new row violates check constraint \"connection_limit\"")
                .with_code("23514"),
        );
        assert_eq!(err.code(), "23514");

        let err = classify(DriverError::new("server closed").with_code("08006"));
        assert_eq!(err.code(), "CONNECTION_ERROR");

        let err = classify(DriverError::new("admin shutdown").with_code("57P01"));
        assert_eq!(err.code(), "CONNECTION_ERROR");

        let err = classify(DriverError::new("query canceled").with_code("57014"));
        assert_eq!(err.code(), "57014");
    }

    #[test]
    fn closed_flag_is_connection_error() {
        let err = classify(DriverError::new("io error").closed());
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn unavailable_handle_is_not_initialized() {
        let err = classify(DriverError::new("connection pool is closed").unavailable());
        assert_eq!(err.code(), "CLIENT_NOT_INITIALIZED");
    }

    #[test]
    fn unique_violation_passes_through() {
        let err = classify(
            DriverError::new("duplicate key value violates unique constraint \"videos_slug_key\"")
                .with_code("23505")
                .with_detail("Key (slug)=(core-1) already exists."),
        );
        assert_eq!(err.code(), "23505");
        assert_eq!(err.detail(), Some("Key (slug)=(core-1) already exists."));
        assert!(err.is_unique_violation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn conversion_failure_is_never_a_connection_error() {
        let err = classify(
            DriverError::new("failed to decode column \"closedAt\" (timestamptz): value out of range")
                .conversion(),
        );
        assert_eq!(err.code(), "UNKNOWN");
        assert!(!err.is_retryable());

        let err = classify(
            DriverError::new("error serializing parameter 1: invalid boolean literal \"timeout\"")
                .conversion(),
        );
        assert!(matches!(err, DbError::Driver(_)));
    }

    #[test]
    fn unknown_without_code() {
        let err = classify(DriverError::new("syntax is weird"));
        assert_eq!(err.code(), "UNKNOWN");
    }
}
