use thiserror::Error;

/// Result type alias used across the strata crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy of the data layer.
///
/// Backends normalize native driver failures into these variants, keeping the
/// original driver code and message attached. Callers never see
/// driver-specific error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad or missing connection configuration, raised at construction time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The target table is absent at the schema level.
    #[error("Table {table} doesn't exist ({code}): {message}")]
    TableDoesntExist {
        table: String,
        /// Dialect error code ("1146" on MySQL, "42P01" on Postgres, ...).
        code: String,
        message: String,
    },

    /// The virtual query operation cannot be expressed by the dialect.
    #[error("Operation {0} not supported")]
    UnsupportedOperation(String),

    /// A dialect writer did not override an operation renderer.
    #[error("{writer}::{operation} should have been overridden")]
    NotImplemented { writer: String, operation: String },

    /// Transport or authentication failure talking to the database.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Unique or foreign key constraint rejected by the engine.
    #[error("Constraint violation ({code}): {message}")]
    ConstraintViolation { code: String, message: String },

    /// Any other driver error, normalized with its code and message.
    #[error("Query error ({code}): {message}")]
    Query { code: String, message: String },

    /// A result row could not be mapped onto a model field.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn table_doesnt_exist(
        table: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TableDoesntExist {
            table: table.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_operation(operation: impl ToString) -> Self {
        Self::UnsupportedOperation(operation.to_string())
    }

    pub fn not_implemented(writer: &str, operation: impl ToString) -> Self {
        Self::NotImplemented {
            writer: writer.into(),
            operation: operation.to_string(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn is_table_doesnt_exist(&self) -> bool {
        matches!(self, Self::TableDoesntExist { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// The dialect error code carried by this error, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::TableDoesntExist { code, .. }
            | Self::ConstraintViolation { code, .. }
            | Self::Query { code, .. } => Some(code),
            _ => None,
        }
    }
}
