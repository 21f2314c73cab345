//! Error types for pgtable

use thiserror::Error;

/// Result type alias for pgtable operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for table and result-set operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Could not establish a connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection was disconnected or closed by the driver
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Bad identifier or value
    #[error("Validation error: {0}")]
    Validation(String),

    /// A multi-condition lookup was given no conditions
    #[error("Conditions cannot be empty")]
    EmptyCondition,

    /// Nothing is left to write once the primary key is excluded
    #[error("Record has no columns to write")]
    EmptyRecord,

    /// The primary-key column is absent from the targeted row
    #[error("Primary key '{0}' not found in the collection")]
    MissingPrimaryKey(String),

    /// The result set holds fewer rows than the operation requires
    #[error("Collection must have at least {needed} rows, got {got}")]
    InsufficientRows { needed: usize, got: usize },

    /// A result set was built from zero rows
    #[error("Result set cannot be built from zero rows")]
    EmptyResult,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A driver failure, tagged with the operation that issued the statement
    #[error("{operation} function error: {source}")]
    Engine {
        operation: &'static str,
        #[source]
        source: Box<OrmError>,
    },

    /// The unit of work failed and the transaction was rolled back
    #[error("Transaction error: {source}")]
    Transaction {
        #[source]
        source: Box<OrmError>,
    },

    /// `transaction` was called while one is already active on the connection
    #[error("A transaction is already active on this connection")]
    TransactionActive,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a driver failure with the name of the operation that caused it.
    ///
    /// `ConnectionClosed` is passed through untouched.
    pub fn engine(operation: &'static str, err: OrmError) -> Self {
        match err {
            Self::ConnectionClosed => Self::ConnectionClosed,
            other => Self::Engine {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// Wrap the cause of a rolled-back transaction.
    pub fn transaction(err: OrmError) -> Self {
        Self::Transaction {
            source: Box::new(err),
        }
    }

    /// The innermost error, looking through `Engine` and `Transaction` wrappers.
    pub fn root(&self) -> &OrmError {
        match self {
            Self::Engine { source, .. } | Self::Transaction { source } => source.root(),
            other => other,
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.root(), Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }

    /// Check if the connection was closed
    pub fn is_connection_closed(&self) -> bool {
        matches!(self.root(), Self::ConnectionClosed)
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::ConnectionClosed;
        }
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
        Self::Query(err)
    }
}
