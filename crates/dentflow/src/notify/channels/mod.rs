//! Channel dispatchers and the external sender contracts.
//!
//! Each dispatcher is a narrow adapter over an out-of-scope provider
//! client. Dispatch never raises: every attempt resolves to a boolean so
//! one channel's failure cannot abort another's.

use std::time::Duration;

use thiserror::Error;

use crate::db::subscription_repo::PushSubscriptionRow;

pub mod email;
pub mod in_app;
pub mod push;
pub mod sms;

pub use email::EmailDispatcher;
pub use in_app::InAppDispatcher;
pub use push::PushDispatcher;
pub use sms::SmsDispatcher;

/// A failed provider send.
#[derive(Error, Debug)]
pub enum SendError {
    /// The provider has no credentials; a soft no-op for the channel.
    #[error("Provider not configured")]
    Unconfigured,

    /// The provider reported the destination permanently gone
    /// (HTTP 404/410 for a push subscription).
    #[error("Destination gone")]
    Gone,

    #[error("Send timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Send failed: {0}")]
    Failed(String),
}

/// External email provider contract (SMTP relay, API client, ...).
///
/// `send` is called synchronously on the notifying thread, so
/// implementations must bound the attempt with a network timeout on the
/// order of seconds and return `SendError::TimedOut` when it elapses.
pub trait EmailSender: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError>;
}

/// External SMS provider contract (Twilio-like client).
///
/// Same timeout contract as [`EmailSender`]: bound the send, return
/// `SendError::TimedOut` on expiry.
pub trait SmsSender: Send + Sync {
    fn send(&self, to: &str, body: &str) -> Result<(), SendError>;
}

/// External web-push provider contract. Called once per subscription,
/// under the same per-attempt timeout contract as [`EmailSender`].
pub trait PushSender: Send + Sync {
    fn send(
        &self,
        subscription: &PushSubscriptionRow,
        title: &str,
        body: &str,
    ) -> Result<(), SendError>;
}
