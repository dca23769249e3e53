use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum DentflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub type Result<T> = std::result::Result<T, DentflowError>;
