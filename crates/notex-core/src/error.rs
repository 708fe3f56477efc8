//! Error types for notex.

use thiserror::Error;

/// Result type alias using notex's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notex operations.
///
/// Subscriber delivery failures are deliberately absent: they are counted and
/// logged inside the broadcast registry and never surface to a caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    /// Invalid input (missing or malformed request fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoteNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_note_not_found() {
        let err = Error::NoteNotFound(999);
        assert_eq!(err.to_string(), "Note not found: 999");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("Name is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: Name is required");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("PORT must be a number".to_string());
        assert_eq!(err.to_string(), "Configuration error: PORT must be a number");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NoteNotFound(1).is_not_found());
        assert!(!Error::InvalidInput("x".into()).is_not_found());
        assert!(!Error::Database(sqlx::Error::PoolTimedOut).is_not_found());
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(err.to_string().starts_with("Database error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
