use crate::{
    error::HttpError,
    models::engagementmodel::{JobStatus, ProposalStatus},
};
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Proposal {0} not found")]
    ProposalNotFound(Uuid),

    #[error("Contract {0} not found")]
    ContractNotFound(Uuid),

    #[error("No ledger entry recorded for gateway reference {0}")]
    EntryNotFound(String),

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to view proposal {1}")]
    UnauthorizedProposalAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to view contract {1}")]
    UnauthorizedContractAccess(Uuid, Uuid),

    #[error("Job {0} is in status {1:?}")]
    InvalidJobStatus(Uuid, JobStatus),

    #[error("Proposal {0} is in status {1:?}")]
    InvalidProposalStatus(Uuid, ProposalStatus),

    #[error("An active proposal from this freelancer already exists for job {0}")]
    DuplicateSubmission(Uuid),

    #[error("Gateway reference {0} is already recorded")]
    DuplicateReference(String),

    #[error("Amount must be a positive integer in minor units")]
    InvalidAmount,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage temporarily unavailable, please retry")]
    Unavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::ProposalNotFound(_)
            | ServiceError::ContractNotFound(_)
            | ServiceError::EntryNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::UnauthorizedJobAccess(_, _)
            | ServiceError::UnauthorizedProposalAccess(_, _)
            | ServiceError::UnauthorizedContractAccess(_, _) => StatusCode::FORBIDDEN,

            ServiceError::InvalidJobStatus(_, _)
            | ServiceError::InvalidProposalStatus(_, _)
            | ServiceError::DuplicateSubmission(_)
            | ServiceError::DuplicateReference(_) => StatusCode::CONFLICT,

            ServiceError::InvalidAmount
            | ServiceError::InsufficientBalance { .. }
            | ServiceError::MalformedPayload(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::InvalidSignature => StatusCode::UNAUTHORIZED,

            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the transient storage faults (serialization conflicts,
    /// deadlocks) that are retried a bounded number of times before
    /// surfacing as `Unavailable`.
    pub fn is_retryable(err: &sqlx::Error) -> bool {
        match err.as_database_error() {
            Some(db_err) => matches!(
                db_err.code().as_deref(),
                Some("40001") | Some("40P01")
            ),
            None => false,
        }
    }

    /// Maps a unique-constraint violation on the given constraint to the
    /// provided error; everything else passes through as a database error.
    pub fn from_unique_violation(
        err: sqlx::Error,
        constraint: &str,
        mapped: ServiceError,
    ) -> ServiceError {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(constraint)
            {
                return mapped;
            }
        }
        ServiceError::Database(err)
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {}", error);
            HttpError::server_error("Something went wrong, please try again")
        } else {
            HttpError::new(error.to_string(), status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_taxonomy_maps_to_expected_status_codes() {
        let job_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert_eq!(
            ServiceError::JobNotFound(job_id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::UnauthorizedJobAccess(user_id, job_id).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::InvalidJobStatus(job_id, JobStatus::Assigned).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::DuplicateSubmission(job_id).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientBalance {
                required: 1500,
                available: 1000
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidAmount.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn internal_details_do_not_leak_to_http() {
        let http: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message.contains("RowNotFound"));
    }

    #[test]
    fn row_not_found_is_not_retryable() {
        assert!(!ServiceError::is_retryable(&sqlx::Error::RowNotFound));
    }
}
