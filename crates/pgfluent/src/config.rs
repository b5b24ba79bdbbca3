//! Runtime configuration for [`Database`](crate::Database).

/// Environment variable holding the connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable overriding [`DbConfig::pool_max_size`].
pub const ENV_POOL_MAX_SIZE: &str = "PGFLUENT_POOL_MAX_SIZE";
/// Environment variable overriding [`DbConfig::include_original_errors`].
pub const ENV_INCLUDE_ORIGINAL_ERRORS: &str = "PGFLUENT_INCLUDE_ORIGINAL_ERRORS";

/// Configuration for a [`Database`](crate::Database) handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Connection string. `None` leaves the handle uninitialized.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: usize,
    /// Attach the driver's own error text to [`ErrorInfo`](crate::ErrorInfo).
    pub include_original_errors: bool,
    /// Truncate SQL in log events to this many bytes.
    pub max_logged_sql_length: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_max_size: 16,
            include_original_errors: cfg!(debug_assertions),
            max_logged_sql_length: 200,
        }
    }
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` (if present) and read the process environment.
    ///
    /// Malformed numeric/boolean overrides are ignored with a warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or empty keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.database_url = get(ENV_DATABASE_URL);

        if let Some(raw) = get(ENV_POOL_MAX_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.pool_max_size = n,
                _ => tracing::warn!(
                    target: "pgfluent.config",
                    key = ENV_POOL_MAX_SIZE,
                    value = %raw,
                    "ignoring invalid pool size"
                ),
            }
        }

        if let Some(raw) = get(ENV_INCLUDE_ORIGINAL_ERRORS) {
            match parse_flag(&raw) {
                Some(flag) => config.include_original_errors = flag,
                None => tracing::warn!(
                    target: "pgfluent.config",
                    key = ENV_INCLUDE_ORIGINAL_ERRORS,
                    value = %raw,
                    "ignoring invalid boolean"
                ),
            }
        }

        config
    }

    /// Set the connection string.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set maximum pooled connections.
    pub fn pool_max_size(mut self, size: usize) -> Self {
        self.pool_max_size = size;
        self
    }

    /// Attach (or hide) the driver's original error text in error responses.
    pub fn include_original_errors(mut self, include: bool) -> Self {
        self.include_original_errors = include;
        self
    }

    /// Set the SQL truncation length for log events.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = len;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
