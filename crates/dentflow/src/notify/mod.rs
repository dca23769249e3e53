//! Customer notification engine: template rendering, preference and
//! quiet-hours gating, and per-channel dispatch.

pub mod channels;
pub mod message;
pub mod orchestrator;
pub mod quiet_hours;
pub mod template;

pub use channels::{
    EmailDispatcher, EmailSender, InAppDispatcher, PushDispatcher, PushSender, SendError,
    SmsDispatcher, SmsSender,
};
pub use message::RenderedMessage;
pub use orchestrator::{DispatchOutcome, NotificationOrchestrator};
pub use quiet_hours::QuietHours;
pub use template::{Channel, TemplateContent};
