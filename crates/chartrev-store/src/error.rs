//! Storage errors

use chartrev_model::ModelError;

/// Backend failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Insert collided with an identical active row
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// Row could not be decoded into the model
    #[error("invalid {table} row: {reason}")]
    InvalidRow { table: &'static str, reason: String },

    /// Model-level parse failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Config could not be serialized for storage
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by a non-SQL backend
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is a benign duplicate-row rejection
    #[inline]
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return Self::UniqueViolation(err.to_string());
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_failures_are_classified() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed".to_string()),
        );
        assert!(StoreError::from(err).is_unique_violation());

        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(!StoreError::from(err).is_unique_violation());
    }
}
