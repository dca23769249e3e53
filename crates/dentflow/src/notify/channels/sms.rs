//! SMS channel adapter with per-destination rate limiting.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::db::{sms_log_repo, Database};

use super::{SendError, SmsSender};

/// Longest message body forwarded to the provider (two concatenated
/// segments); longer texts are truncated.
const MAX_SMS_LEN: usize = 320;

const DEFAULT_HOURLY_CAP: u64 = 5;
const DEFAULT_DAILY_CAP: u64 = 20;

/// Wraps the external SMS provider and enforces trailing-window send caps
/// per destination number.
#[derive(Clone)]
pub struct SmsDispatcher {
    db: Database,
    sender: Option<Arc<dyn SmsSender>>,
    hourly_cap: u64,
    daily_cap: u64,
}

impl SmsDispatcher {
    pub fn new(db: Database, sender: Option<Arc<dyn SmsSender>>) -> Self {
        Self {
            db,
            sender,
            hourly_cap: DEFAULT_HOURLY_CAP,
            daily_cap: DEFAULT_DAILY_CAP,
        }
    }

    /// Overrides the default send caps.
    pub fn with_caps(mut self, hourly: u64, daily: u64) -> Self {
        self.hourly_cap = hourly;
        self.daily_cap = daily;
        self
    }

    /// Attempts delivery. Requires a non-empty destination number.
    /// Never raises; failures and cap hits are logged and reported as `false`.
    pub fn dispatch(&self, to: &str, body: &str) -> bool {
        if to.is_empty() {
            log::debug!("SMS dispatch skipped: empty destination");
            return false;
        }
        let Some(sender) = &self.sender else {
            log::debug!("SMS dispatch skipped: no provider configured");
            return false;
        };
        if self.over_cap(to) {
            return false;
        }

        let body = truncate(body, MAX_SMS_LEN);
        match sender.send(to, body) {
            Ok(()) => {
                // The cap check read and this write can race at a window
                // boundary; an occasional extra send is tolerable.
                if let Err(e) = sms_log_repo::record_send(&self.db, to, &Utc::now().to_rfc3339()) {
                    log::warn!("Failed to record SMS send to {}: {}", to, e);
                }
                log::info!("SMS sent to {}", to);
                true
            }
            Err(e) => {
                log::warn!("SMS to {} failed: {}", to, e);
                false
            }
        }
    }

    fn over_cap(&self, to: &str) -> bool {
        let now = Utc::now();
        let hour_ago = (now - Duration::hours(1)).to_rfc3339();
        let day_ago = (now - Duration::hours(24)).to_rfc3339();

        match sms_log_repo::count_since(&self.db, to, &hour_ago) {
            Ok(count) if count >= self.hourly_cap => {
                log::warn!("SMS hourly cap reached for {} ({} sends)", to, count);
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("SMS rate check failed for {}: {}", to, e);
                return true;
            }
        }
        match sms_log_repo::count_since(&self.db, to, &day_ago) {
            Ok(count) if count >= self.daily_cap => {
                log::warn!("SMS daily cap reached for {} ({} sends)", to, count);
                true
            }
            Ok(_) => false,
            Err(e) => {
                log::warn!("SMS rate check failed for {}: {}", to, e);
                true
            }
        }
    }
}

/// Truncates at a character boundary.
fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
