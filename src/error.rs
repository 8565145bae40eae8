//! Error types for casebook.
//!
//! Uses thiserror for derive macros. Every failure is local to the single
//! operation that produced it; nothing here is retried automatically.

use crate::exit_codes;
use crate::locks::Lock;
use thiserror::Error;

/// Main error type for casebook operations.
#[derive(Error, Debug)]
pub enum CasebookError {
    /// A required field was missing or blank. Nothing was mutated.
    #[error("{0}")]
    ValidationError(String),

    /// The case is locked by another owner. Carries the existing lock.
    #[error("case is locked by {}", .lock.holder_name())]
    Conflict { lock: Box<Lock> },

    /// Renewal without a live lock owned by the caller.
    ///
    /// Deliberately does not say whether the case is locked at all.
    #[error("lock not found or not owned by caller")]
    NotOwner,

    /// Release of a lock held by another owner.
    #[error("cannot release a lock held by another owner")]
    Forbidden,

    /// Unknown case id.
    #[error("case '{0}' not found")]
    NotFound(String),

    /// Persistence failed: read, parse, serialize, write, or rename.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CasebookError {
    /// Build a conflict error from the lock that caused it.
    pub fn conflict(lock: Lock) -> Self {
        CasebookError::Conflict {
            lock: Box::new(lock),
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CasebookError::ValidationError(_) => exit_codes::USER_ERROR,
            CasebookError::NotFound(_) => exit_codes::USER_ERROR,
            CasebookError::Config(_) => exit_codes::USER_ERROR,
            CasebookError::Storage(_) => exit_codes::STORAGE_FAILURE,
            CasebookError::Conflict { .. } => exit_codes::LOCK_FAILURE,
            CasebookError::NotOwner => exit_codes::LOCK_FAILURE,
            CasebookError::Forbidden => exit_codes::LOCK_FAILURE,
        }
    }

    /// The lock attached to a conflict, if any.
    pub fn conflicting_lock(&self) -> Option<&Lock> {
        match self {
            CasebookError::Conflict { lock } => Some(lock),
            _ => None,
        }
    }
}

/// Result type alias for casebook operations.
pub type Result<T> = std::result::Result<T, CasebookError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::Owner;

    fn held_lock() -> Lock {
        Lock::new("5", Owner::new("u-1", "Ana"), 0, 180)
    }

    #[test]
    fn validation_error_has_correct_exit_code() {
        let err = CasebookError::ValidationError("name is required".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn lock_errors_share_lock_exit_code() {
        assert_eq!(
            CasebookError::conflict(held_lock()).exit_code(),
            exit_codes::LOCK_FAILURE
        );
        assert_eq!(CasebookError::NotOwner.exit_code(), exit_codes::LOCK_FAILURE);
        assert_eq!(CasebookError::Forbidden.exit_code(), exit_codes::LOCK_FAILURE);
    }

    #[test]
    fn storage_error_has_correct_exit_code() {
        let err = CasebookError::Storage("disk full".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORAGE_FAILURE);
    }

    #[test]
    fn conflict_names_the_holder() {
        let err = CasebookError::conflict(held_lock());
        assert_eq!(err.to_string(), "case is locked by Ana");
        assert_eq!(err.conflicting_lock().map(|l| l.case_id.as_str()), Some("5"));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = CasebookError::NotFound("42".to_string());
        assert_eq!(err.to_string(), "case '42' not found");

        let err = CasebookError::NotOwner;
        assert_eq!(err.to_string(), "lock not found or not owned by caller");
    }
}
