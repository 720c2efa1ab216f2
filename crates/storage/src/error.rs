use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No stage position scoring rules are configured")]
    MissingScoringRules,

    #[error("Stage {0} is not the final stage")]
    NotFinalStage(Uuid),

    #[error("Unrecoverable state: {0}")]
    Unrecoverable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Turn a foreign key violation into a `Validation` error naming what was
    /// referenced. Other errors are returned unchanged.
    pub fn reject_dangling_reference(self, referenced: &str) -> Self {
        if self.is_foreign_key_violation() {
            StorageError::Validation(format!("Unknown {} referenced", referenced))
        } else {
            self
        }
    }

    /// Exclusion constraint violation, raised by the active roster slot constraint.
    pub fn is_exclusion_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23P01")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_constraint_violations() {
        let err = StorageError::NotFound;
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
        assert!(!err.is_exclusion_violation());
    }

    #[test]
    fn test_dangling_reference_leaves_other_errors_alone() {
        let err = StorageError::NotFound.reject_dangling_reference("rider");
        assert!(matches!(err, StorageError::NotFound));

        let err = StorageError::Validation("bad".to_string()).reject_dangling_reference("rider");
        assert_eq!(err.to_string(), "Validation error: bad");
    }

    #[test]
    fn test_error_messages() {
        let id = Uuid::nil();
        assert_eq!(
            StorageError::NotFinalStage(id).to_string(),
            format!("Stage {id} is not the final stage")
        );
        assert_eq!(
            StorageError::MissingScoringRules.to_string(),
            "No stage position scoring rules are configured"
        );
    }
}
