//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid region code '{0}'")]
    InvalidCode(String),

    #[error("region name must not be empty")]
    EmptyName,

    #[error("region name too long: {length} bytes (max {max})")]
    NameTooLong { length: usize, max: usize },

    #[error("invalid level: {0} (expected 0-5)")]
    InvalidLevel(u8),

    #[error("node not found in tree")]
    UnknownNode,

    #[error("dangling parent reference in ancestry of: {0}")]
    DanglingReference(String),

    #[error("cycle detected in hierarchy at: {0}")]
    CycleDetected(String),

    #[error("allocation failed while building tree: {0}")]
    ResourceExhausted(String),
}

impl DomainError {
    /// True for errors caused by malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidCode(_)
                | DomainError::EmptyName
                | DomainError::NameTooLong { .. }
                | DomainError::InvalidLevel(_)
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
