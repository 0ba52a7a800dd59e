//! Error types for fluentsql

use thiserror::Error;

/// Result type alias for render operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types raised while constructing a statement.
///
/// Every error is synchronous and terminal for that render: the engine never
/// returns partial SQL and never falls back to a "safe" guess for an
/// ambiguous or dangerous statement.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Malformed or missing required input: empty id list, empty condition
    /// map, empty update-assignment set, empty entity batch.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Insert-without-pk given a set primary key, or insert-with-pk given an
    /// unset one.
    #[error("Primary key policy violation: {0}")]
    PrimaryKeyPolicy(String),

    /// An update against a versioned entity omits the version condition and
    /// lock checking was not explicitly suppressed.
    #[error("Optimistic lock guard: {0}")]
    OptimisticLockGuard(String),

    /// The table mapping lacks a capability the operation requires, e.g. a
    /// logical delete against an entity with no logic-delete column.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SqlError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a primary key policy error
    pub fn primary_key(message: impl Into<String>) -> Self {
        Self::PrimaryKeyPolicy(message.into())
    }

    /// Create an optimistic lock guard error
    pub fn lock_guard(message: impl Into<String>) -> Self {
        Self::OptimisticLockGuard(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an optimistic lock guard error
    pub fn is_lock_guard(&self) -> bool {
        matches!(self, Self::OptimisticLockGuard(_))
    }
}
