use sea_orm::error::DbErr;
use sea_orm::SqlErr;

use crate::lifecycle::EntityKind;
use crate::services::cascade_reset::ResetReport;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: EntityKind,
        from: String,
        to: String,
    },

    #[error("Dependency cycle between entity kinds: {0:?}")]
    DependencyCycle(Vec<EntityKind>),

    #[error("Cannot preserve {preserved} while deleting its required parent {parent}")]
    PreservationConflict {
        preserved: EntityKind,
        parent: EntityKind,
    },

    /// A reset step failed. `completed` holds what earlier steps deleted; in
    /// atomic mode those deletions were rolled back.
    #[error("Reset failed while deleting {kind}: {source}")]
    ResetStepFailed {
        kind: EntityKind,
        source: DbErr,
        completed: Box<ResetReport>,
    },

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", kind, id))
    }

    /// True when the underlying database error is a unique-key violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseError(err) => is_unique_violation(err),
            _ => false,
        }
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
