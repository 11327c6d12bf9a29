//! Service error types.

use thiserror::Error;

use crate::filter::PagingError;
use crate::store::StoreError;
use crate::validate::ValidationError;

/// Errors returned by the entity services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {key} already exists")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("an identical house change request already exists for student {student}")]
    DuplicateRequest { student: i32 },

    #[error("person {id_number} is a student and is managed through the student records")]
    StudentAccount { id_number: i32 },

    #[error("house change requests are not being accepted")]
    SubmissionsClosed,

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Paging(#[from] PagingError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::DuplicateKey {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether the caller's input caused the failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Persistence(_))
    }
}

/// Result type alias using ServiceError.
pub type ServiceResult<T> = Result<T, ServiceError>;
