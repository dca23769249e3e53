//! Job workflow: the status set, transition table, and state machine.

pub mod engine;
pub mod error;
pub mod status;
pub mod transitions;

pub use engine::{NewJob, TransitionOutcome, WorkflowEngine};
pub use error::WorkflowError;
pub use status::{JobStatus, ALL_STATUSES};
pub use transitions::{is_valid_transition, valid_next};
