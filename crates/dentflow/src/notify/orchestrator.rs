//! The notification orchestrator: decides whether and how to notify a
//! customer about a job-status transition.
//!
//! Every failure is isolated here. The orchestrator never returns an
//! error; the caller (normally the workflow engine) only receives the
//! per-channel result map.

use std::sync::Arc;

use chrono::{Local, NaiveTime};

use crate::config::CompanyConfig;
use crate::db::preference_repo::{self, PreferenceRow};
use crate::db::{job_repo, Database};
use crate::workflow::JobStatus;

use super::channels::{
    EmailDispatcher, EmailSender, InAppDispatcher, PushDispatcher, PushSender, SmsDispatcher,
    SmsSender,
};
use super::message;
use super::quiet_hours::QuietHours;

/// Per-channel result map for one notification event. Diagnostic only:
/// the triggering transition has already succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub in_app: bool,
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl DispatchOutcome {
    pub fn any_delivered(&self) -> bool {
        self.in_app || self.email || self.sms || self.push
    }
}

/// Fans a status-change message out to the customer's enabled channels.
pub struct NotificationOrchestrator {
    db: Database,
    config: CompanyConfig,
    in_app: InAppDispatcher,
    email: EmailDispatcher,
    sms: SmsDispatcher,
    push: PushDispatcher,
}

impl NotificationOrchestrator {
    /// Creates an orchestrator with no outbound providers configured.
    /// In-app notifications always work; email/SMS/push soft-fail until a
    /// sender is attached.
    pub fn new(db: Database, config: CompanyConfig) -> Self {
        Self {
            in_app: InAppDispatcher::new(db.clone()),
            email: EmailDispatcher::default(),
            sms: SmsDispatcher::new(db.clone(), None),
            push: PushDispatcher::new(db.clone(), None),
            db,
            config,
        }
    }

    pub fn with_email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = EmailDispatcher::new(Some(sender));
        self
    }

    pub fn with_sms_sender(mut self, sender: Arc<dyn SmsSender>) -> Self {
        self.sms = SmsDispatcher::new(self.db.clone(), Some(sender));
        self
    }

    pub fn with_push_sender(mut self, sender: Arc<dyn PushSender>) -> Self {
        self.push = PushDispatcher::new(self.db.clone(), Some(sender));
        self
    }

    /// Notifies the customer of `job_id` about a transition to `to`,
    /// evaluated against the current local wall clock.
    pub fn notify_status_change(
        &self,
        job_id: &str,
        from: Option<JobStatus>,
        to: JobStatus,
        note: Option<&str>,
    ) -> DispatchOutcome {
        self.notify_status_change_at(job_id, from, to, note, Local::now().time())
    }

    /// Clock-injected variant for deterministic quiet-hours evaluation.
    pub fn notify_status_change_at(
        &self,
        job_id: &str,
        from: Option<JobStatus>,
        to: JobStatus,
        note: Option<&str>,
        now: NaiveTime,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        let job = match job_repo::find_active(&self.db, job_id) {
            Ok(Some(job)) => job,
            Ok(None) => {
                log::warn!("Notification skipped: job {} not found", job_id);
                return outcome;
            }
            Err(e) => {
                log::error!("Notification skipped: failed to load job {}: {}", job_id, e);
                return outcome;
            }
        };

        let pref = match preference_repo::get(&self.db, &job.customer_id) {
            Ok(pref) => pref,
            Err(e) => {
                log::warn!(
                    "Preference load failed for {}, using defaults: {}",
                    job.customer_id,
                    e
                );
                PreferenceRow::defaults(&job.customer_id)
            }
        };

        if !pref.notifies_on(to.as_str()) {
            log::debug!(
                "Notification skipped for job {}: {} not in customer's notify set",
                job_id,
                to
            );
            return outcome;
        }

        let rendered = message::format_status_message(&self.db, &self.config, &job, to, note);

        // The in-app record is written even during quiet hours.
        if pref.in_app_enabled {
            outcome.in_app = self
                .in_app
                .dispatch(
                    &job.customer_id,
                    Some(&job.id),
                    &rendered.title,
                    &rendered.message,
                    &rendered.priority,
                )
                .is_some();
        }

        if quiet_hours_of(&pref).is_some_and(|q| q.contains(now)) {
            log::info!(
                "Quiet hours for {}: outbound channels suppressed for job {}",
                job.customer_id,
                job_id
            );
            return outcome;
        }

        if pref.email_enabled {
            outcome.email = self.email.dispatch(
                job.customer_email.as_deref().unwrap_or(""),
                &rendered.email_subject,
                &rendered.email_body,
            );
        }
        if pref.sms_enabled {
            outcome.sms = self.sms.dispatch(
                job.customer_phone.as_deref().unwrap_or(""),
                &rendered.sms_body,
            );
        }
        if pref.push_enabled {
            outcome.push = self
                .push
                .dispatch(&job.customer_id, &rendered.push_title, &rendered.push_body);
        }

        log::info!(
            "Notification for job {} ({} -> {}): {:?}",
            job_id,
            from.map(|s| s.as_str()).unwrap_or("-"),
            to,
            outcome
        );
        outcome
    }
}

fn quiet_hours_of(pref: &PreferenceRow) -> Option<QuietHours> {
    let start = pref.quiet_hours_start.as_deref()?;
    let end = pref.quiet_hours_end.as_deref()?;
    let parsed = QuietHours::parse(start, end);
    if parsed.is_none() {
        log::warn!(
            "Malformed quiet hours for {}: '{}'-'{}'",
            pref.customer_id,
            start,
            end
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repo::JobRow;
    use crate::db::notification_repo;
    use std::sync::Mutex;

    use super::super::channels::SendError;

    struct RecordingEmail {
        sent: Mutex<Vec<String>>,
    }

    impl EmailSender for RecordingEmail {
        fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    struct RecordingSms {
        sent: Mutex<Vec<String>>,
    }

    impl SmsSender for RecordingSms {
        fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(format!("{}: {}", to, body));
            Ok(())
        }
    }

    struct FailingEmail;

    impl EmailSender for FailingEmail {
        fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), SendError> {
            Err(SendError::Failed("connection refused".to_string()))
        }
    }

    fn seed_job(db: &Database, id: &str, status: &str) -> JobRow {
        let job = JobRow {
            id: id.to_string(),
            job_number: "JOB-2026-0042".to_string(),
            status: status.to_string(),
            customer_id: "cust-1".to_string(),
            customer_name: "Jane".to_string(),
            customer_email: Some("jane@example.com".to_string()),
            customer_phone: Some("+15555550100".to_string()),
            vehicle_description: Some("2023 BMW X5".to_string()),
            assigned_tech: None,
            priority: "normal".to_string(),
            parts_status: None,
            scheduled_drop_off: None,
            actual_drop_off: None,
            scheduled_pickup: None,
            actual_pickup: None,
            completed_at: None,
            status_changed_at: None,
            status_changed_by: None,
            deleted: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        job_repo::insert(db, &job).unwrap();
        job
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_status_outside_notify_set_produces_nothing() {
        let db = Database::open_in_memory().unwrap();
        seed_job(&db, "job-1", "ASSIGNED_TO_TECH");
        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default());

        // Default notify set does not include WAITING_QC.
        let outcome =
            orch.notify_status_change("job-1", Some(JobStatus::TechComplete), JobStatus::WaitingQc, None);
        assert_eq!(outcome, DispatchOutcome::default());
        assert_eq!(notification_repo::count_for_customer(&db, "cust-1").unwrap(), 0);
    }

    #[test]
    fn test_qualifying_status_creates_in_app_and_sends_email() {
        let db = Database::open_in_memory().unwrap();
        seed_job(&db, "job-1", "QC_COMPLETE");
        let email = Arc::new(RecordingEmail {
            sent: Mutex::new(Vec::new()),
        });
        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default())
            .with_email_sender(email.clone());

        let outcome = orch.notify_status_change(
            "job-1",
            Some(JobStatus::QcComplete),
            JobStatus::ReadyForPickup,
            None,
        );
        assert!(outcome.in_app);
        assert!(outcome.email);
        // SMS and push are off by default.
        assert!(!outcome.sms);
        assert!(!outcome.push);

        assert_eq!(email.sent.lock().unwrap().as_slice(), ["jane@example.com"]);
        let records = notification_repo::list_for_customer(&db, "cust-1", false, 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Vehicle Ready for Pickup");
        assert_eq!(records[0].job_id.as_deref(), Some("job-1"));
    }

    #[test]
    fn test_quiet_hours_suppress_outbound_but_keep_in_app() {
        let db = Database::open_in_memory().unwrap();
        seed_job(&db, "job-1", "QC_COMPLETE");

        let mut pref = PreferenceRow::defaults("cust-1");
        pref.quiet_hours_start = Some("22:00".to_string());
        pref.quiet_hours_end = Some("08:00".to_string());
        preference_repo::set(&db, &pref).unwrap();

        let email = Arc::new(RecordingEmail {
            sent: Mutex::new(Vec::new()),
        });
        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default())
            .with_email_sender(email.clone());

        // 23:30 — inside the window.
        let outcome = orch.notify_status_change_at(
            "job-1",
            None,
            JobStatus::ReadyForPickup,
            None,
            t("23:30"),
        );
        assert!(outcome.in_app);
        assert!(!outcome.email);
        assert!(email.sent.lock().unwrap().is_empty());
        assert_eq!(notification_repo::count_for_customer(&db, "cust-1").unwrap(), 1);

        // 09:00 — outside the window, same change now dispatches.
        let outcome =
            orch.notify_status_change_at("job-1", None, JobStatus::ReadyForPickup, None, t("09:00"));
        assert!(outcome.in_app);
        assert!(outcome.email);
        assert_eq!(email.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_channel_failure_is_isolated() {
        let db = Database::open_in_memory().unwrap();
        seed_job(&db, "job-1", "WAITING_WRITEUP");

        let mut pref = PreferenceRow::defaults("cust-1");
        pref.sms_enabled = true;
        preference_repo::set(&db, &pref).unwrap();

        let sms = Arc::new(RecordingSms {
            sent: Mutex::new(Vec::new()),
        });
        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default())
            .with_email_sender(Arc::new(FailingEmail))
            .with_sms_sender(sms.clone());

        let outcome =
            orch.notify_status_change("job-1", None, JobStatus::Approved, Some("hail claim"));
        assert!(!outcome.email);
        assert!(outcome.sms);
        assert!(outcome.in_app);
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_job_aborts_silently() {
        let db = Database::open_in_memory().unwrap();
        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default());

        let outcome = orch.notify_status_change("ghost", None, JobStatus::Approved, None);
        assert_eq!(outcome, DispatchOutcome::default());
        assert!(!outcome.any_delivered());
    }

    #[test]
    fn test_disabled_in_app_writes_no_record() {
        let db = Database::open_in_memory().unwrap();
        seed_job(&db, "job-1", "QC_COMPLETE");

        let mut pref = PreferenceRow::defaults("cust-1");
        pref.in_app_enabled = false;
        pref.email_enabled = false;
        preference_repo::set(&db, &pref).unwrap();

        let orch = NotificationOrchestrator::new(db.clone(), CompanyConfig::default());
        let outcome = orch.notify_status_change("job-1", None, JobStatus::ReadyForPickup, None);
        assert_eq!(outcome, DispatchOutcome::default());
        assert_eq!(notification_repo::count_for_customer(&db, "cust-1").unwrap(), 0);
    }
}
