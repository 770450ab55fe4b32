//! Error types for tsql

use thiserror::Error;

/// Result type alias for tsql operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query construction, compilation and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Table reference does not exist in the schema descriptor
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column reference does not resolve against the schema descriptor
    #[error("Unknown column: {column} (tables in scope: {scope})")]
    UnknownColumn { column: String, scope: String },

    /// UPDATE/DELETE without a WHERE clause and without explicit confirmation
    #[error("Unfiltered {statement} on '{table}': add a predicate or call confirm_unfiltered()")]
    MissingPredicate {
        statement: &'static str,
        table: String,
    },

    /// The active dialect does not support the requested feature
    #[error("Dialect '{dialect}' does not support {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: &'static str,
    },

    /// Malformed query plan
    #[error("Compilation error: {0}")]
    Compilation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection pool exhausted and the wait timeout elapsed
    #[error("Timed out waiting for a pooled connection")]
    PoolTimeout,

    /// `execute_take_first_or_throw` over an empty result set
    #[error("No result: {0}")]
    NoResult(String),

    /// Passthrough for the underlying database driver
    #[error("Driver error: {0}")]
    Driver(#[from] tokio_postgres::Error),

    /// Unique constraint violation (SQLSTATE 23505)
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation (SQLSTATE 23503)
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (SQLSTATE 23514)
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error (JSON values)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a no-result error
    pub fn no_result(message: impl Into<String>) -> Self {
        Self::NoResult(message.into())
    }

    /// Create an unknown-column error
    pub fn unknown_column(column: impl Into<String>, scope: &[String]) -> Self {
        Self::UnknownColumn {
            column: column.into(),
            scope: scope.join(", "),
        }
    }

    /// Check if this is a no-result error
    pub fn is_no_result(&self) -> bool {
        matches!(self, Self::NoResult(_))
    }

    /// Check if this is a pool timeout error
    pub fn is_pool_timeout(&self) -> bool {
        matches!(self, Self::PoolTimeout)
    }

    /// Check if this is a construction-time schema validation error
    pub fn is_schema_validation(&self) -> bool {
        matches!(self, Self::UnknownTable(_) | Self::UnknownColumn { .. })
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific QueryError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Driver(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QueryError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        use deadpool_postgres::PoolError;
        match err {
            PoolError::Timeout(_) => Self::PoolTimeout,
            PoolError::Backend(e) => Self::from_db_error(e),
            other => Self::Connection(other.to_string()),
        }
    }
}
