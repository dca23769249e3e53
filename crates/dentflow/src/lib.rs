pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod workflow;

pub use config::{load_config, CompanyConfig, ConfigError};
pub use db::{Database, DatabaseError};
pub use error::{DentflowError, Result};
pub use notify::{DispatchOutcome, NotificationOrchestrator};
pub use workflow::{JobStatus, NewJob, TransitionOutcome, WorkflowEngine, WorkflowError};
