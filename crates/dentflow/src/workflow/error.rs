//! Workflow error types.

use thiserror::Error;

use crate::db::DatabaseError;

use super::status::JobStatus;

/// Errors from workflow operations.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The referenced job does not exist or is soft-deleted.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The requested status is not reachable from the current status.
    /// Carries the full valid-next set so a UI can present only legal choices.
    #[error(
        "Invalid transition for job {job_id}: {current} -> {requested} (valid next: [{}])",
        .valid_next.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    )]
    InvalidTransition {
        job_id: String,
        current: JobStatus,
        requested: JobStatus,
        valid_next: Vec<JobStatus>,
    },

    /// The stored status column is not a member of the status set.
    #[error("Job {job_id} has unrecognized stored status '{stored}'")]
    CorruptStatus { job_id: String, stored: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
