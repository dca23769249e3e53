//! Email channel adapter.

use std::sync::Arc;

use super::{EmailSender, SendError};

/// Wraps the external email provider. An unset sender means the channel is
/// unconfigured and every dispatch soft-fails.
#[derive(Clone, Default)]
pub struct EmailDispatcher {
    sender: Option<Arc<dyn EmailSender>>,
}

impl EmailDispatcher {
    pub fn new(sender: Option<Arc<dyn EmailSender>>) -> Self {
        Self { sender }
    }

    /// Attempts delivery. Requires a non-empty destination address.
    /// Never raises; failures are logged and reported as `false`.
    pub fn dispatch(&self, to: &str, subject: &str, body: &str) -> bool {
        if to.is_empty() {
            log::debug!("Email dispatch skipped: empty destination");
            return false;
        }
        let Some(sender) = &self.sender else {
            log::debug!("Email dispatch skipped: no provider configured");
            return false;
        };
        match sender.send(to, subject, body) {
            Ok(()) => {
                log::info!("Email sent to {}", to);
                true
            }
            Err(e) => {
                log::warn!("Email to {} failed: {}", to, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), SendError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingSender;

    impl EmailSender for FailingSender {
        fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), SendError> {
            Err(SendError::Failed("SMTP 554".to_string()))
        }
    }

    #[test]
    fn test_dispatch_success() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });
        let dispatcher = EmailDispatcher::new(Some(sender.clone()));

        assert!(dispatcher.dispatch("jane@example.com", "Ready", "body"));
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "jane@example.com");
    }

    #[test]
    fn test_dispatch_empty_destination() {
        let dispatcher = EmailDispatcher::new(Some(Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        })));
        assert!(!dispatcher.dispatch("", "Ready", "body"));
    }

    #[test]
    fn test_dispatch_unconfigured() {
        let dispatcher = EmailDispatcher::default();
        assert!(!dispatcher.dispatch("jane@example.com", "Ready", "body"));
    }

    #[test]
    fn test_dispatch_provider_failure_is_soft() {
        let dispatcher = EmailDispatcher::new(Some(Arc::new(FailingSender)));
        assert!(!dispatcher.dispatch("jane@example.com", "Ready", "body"));
    }

    struct TimingOutSender;

    impl EmailSender for TimingOutSender {
        fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), SendError> {
            Err(SendError::TimedOut(std::time::Duration::from_secs(5)))
        }
    }

    // A provider that hits its send timeout is just another soft failure.
    #[test]
    fn test_dispatch_provider_timeout_is_soft() {
        let dispatcher = EmailDispatcher::new(Some(Arc::new(TimingOutSender)));
        assert!(!dispatcher.dispatch("jane@example.com", "Ready", "body"));
    }
}
