//! Status message formatting: maps a status to template content and
//! assembles the variable bag from job context.

use std::collections::HashMap;

use chrono::Local;

use crate::config::CompanyConfig;
use crate::db::job_repo::JobRow;
use crate::db::{template_repo, Database};
use crate::workflow::JobStatus;

use super::template::{self, Channel, TemplateContent, ALL_CHANNELS};

/// Statuses with authored template content. Everything else falls back to
/// the built-in per-status message triple.
pub fn template_key_for(status: JobStatus) -> Option<&'static str> {
    match status {
        JobStatus::Approved => Some("JOB_APPROVED"),
        JobStatus::InProgress => Some("JOB_IN_PROGRESS"),
        JobStatus::ReadyForPickup => Some("JOB_READY_FOR_PICKUP"),
        JobStatus::Completed => Some("JOB_COMPLETED"),
        _ => None,
    }
}

fn priority_for(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Approved | JobStatus::ReadyForPickup => "high",
        _ => "normal",
    }
}

/// A fully rendered notification, one text per channel shape.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    /// Set when the status mapped to a template key; `None` for fallbacks.
    pub template_key: Option<String>,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub email_subject: String,
    pub email_body: String,
    pub sms_body: String,
    pub push_title: String,
    pub push_body: String,
}

/// Builds the substitution bag from job context plus fixed defaults, so
/// templates referencing company fields or the current date always resolve.
pub fn build_variable_bag(
    job: &JobRow,
    config: &CompanyConfig,
    note: Option<&str>,
) -> HashMap<String, String> {
    let now = Local::now();
    let mut bag = HashMap::new();
    bag.insert("customer_name".to_string(), job.customer_name.clone());
    bag.insert(
        "vehicle".to_string(),
        job.vehicle_description.clone().unwrap_or_default(),
    );
    bag.insert("job_number".to_string(), job.job_number.clone());
    bag.insert(
        "notes".to_string(),
        note.map(|n| format!("Note: {}", n)).unwrap_or_default(),
    );
    bag.insert("company_name".to_string(), config.company_name.clone());
    bag.insert("phone_number".to_string(), config.phone_number.clone());
    bag.insert("portal_url".to_string(), config.portal_url.clone());
    bag.insert("date".to_string(), now.format("%Y-%m-%d").to_string());
    bag.insert("time".to_string(), now.format("%H:%M").to_string());
    bag.insert("year".to_string(), now.format("%Y").to_string());
    bag
}

/// Resolves the template for (key, channel): an active stored version wins
/// over the built-in default for that channel only.
fn resolve(db: &Database, key: &str, channel: Channel) -> Option<TemplateContent> {
    match template_repo::get_active(db, key, channel.as_str()) {
        Ok(Some(row)) => {
            if let Some(content) = TemplateContent::from_stored(&row) {
                return Some(content);
            }
            log::warn!(
                "Stored template {} v{} has unrecognized channel '{}'",
                key,
                row.version,
                row.channel
            );
            template::builtin(key, channel)
        }
        Ok(None) => template::builtin(key, channel),
        Err(e) => {
            log::warn!("Template lookup failed for {}/{}: {}", key, channel, e);
            template::builtin(key, channel)
        }
    }
}

/// Formats the message for a status change against the given job context.
///
/// Renders all four channel bodies; each keyed render is recorded in the
/// usage log best-effort.
pub fn format_status_message(
    db: &Database,
    config: &CompanyConfig,
    job: &JobRow,
    to: JobStatus,
    note: Option<&str>,
) -> RenderedMessage {
    let bag = build_variable_bag(job, config, note);

    if let Some(key) = template_key_for(to) {
        let mut msg = RenderedMessage {
            template_key: Some(key.to_string()),
            title: String::new(),
            message: String::new(),
            priority: priority_for(to).to_string(),
            email_subject: String::new(),
            email_body: String::new(),
            sms_body: String::new(),
            push_title: String::new(),
            push_body: String::new(),
        };

        for channel in ALL_CHANNELS {
            let Some(content) = resolve(db, key, *channel) else {
                continue;
            };
            match content.render(&bag) {
                TemplateContent::Email { subject, body } => {
                    msg.email_subject = subject;
                    msg.email_body = body;
                }
                TemplateContent::Sms { body } => {
                    msg.sms_body = body;
                }
                TemplateContent::Push { title, body } => {
                    msg.push_title = title;
                    msg.push_body = body;
                }
                TemplateContent::InApp { title, body } => {
                    msg.title = title;
                    msg.message = body;
                }
            }
            if let Err(e) = template_repo::record_usage(db, key, channel.as_str(), &job.customer_id)
            {
                log::warn!("Failed to record template usage for {}/{}: {}", key, channel, e);
            }
        }
        return msg;
    }

    // No template key: built-in per-status triple drives every channel.
    let (title, body) = fallback_copy(to);
    let title = template::render(title, &bag);
    let message = template::render(body, &bag);
    RenderedMessage {
        template_key: None,
        email_subject: title.clone(),
        email_body: message.clone(),
        sms_body: message.clone(),
        push_title: title.clone(),
        push_body: message.clone(),
        title,
        message,
        priority: priority_for(to).to_string(),
    }
}

/// Default `{title, message}` copy for statuses without an authored template.
fn fallback_copy(status: JobStatus) -> (&'static str, &'static str) {
    match status {
        JobStatus::New => ("Job Created", "Repair job {{job_number}} has been created."),
        JobStatus::WaitingDropOff => (
            "Drop-Off Pending",
            "We're ready to receive your {{vehicle}} for job {{job_number}}.",
        ),
        JobStatus::DroppedOff => (
            "Vehicle Received",
            "Your {{vehicle}} has been checked in for job {{job_number}}.",
        ),
        JobStatus::WaitingWriteup => (
            "Estimate In Preparation",
            "We're preparing the repair estimate for your {{vehicle}}.",
        ),
        JobStatus::EstimateCreated => (
            "Estimate Ready",
            "The estimate for your {{vehicle}} (job {{job_number}}) is ready.",
        ),
        JobStatus::WaitingInsurance => (
            "Waiting on Insurance",
            "Your claim for job {{job_number}} has been submitted to your insurer.",
        ),
        JobStatus::WaitingAdjuster => (
            "Waiting on Adjuster",
            "We're waiting for an insurance adjuster to review your {{vehicle}}.",
        ),
        JobStatus::AdjusterScheduled => (
            "Adjuster Scheduled",
            "An adjuster inspection has been scheduled for your {{vehicle}}.",
        ),
        JobStatus::AdjusterInspected => (
            "Inspection Complete",
            "The adjuster has inspected your {{vehicle}}.",
        ),
        JobStatus::WaitingApproval => (
            "Waiting for Approval",
            "Job {{job_number}} is awaiting final approval.",
        ),
        JobStatus::Approved => (
            "Estimate Approved",
            "The estimate for your {{vehicle}} has been approved.",
        ),
        JobStatus::WaitingParts => (
            "Waiting on Parts",
            "We're waiting on parts for your {{vehicle}}.",
        ),
        JobStatus::PartsOrdered => (
            "Parts Ordered",
            "Parts for your {{vehicle}} have been ordered.",
        ),
        JobStatus::PartsReceived => (
            "Parts Received",
            "Parts for your {{vehicle}} have arrived.",
        ),
        JobStatus::AssignedToTech => (
            "Technician Assigned",
            "A technician has been assigned to your {{vehicle}}.",
        ),
        JobStatus::InProgress => (
            "Repair In Progress",
            "Work on your {{vehicle}} is underway.",
        ),
        JobStatus::TechComplete => (
            "Repair Work Finished",
            "Repair work on your {{vehicle}} is finished and headed to quality control.",
        ),
        JobStatus::WaitingQc => (
            "Quality Control",
            "Your {{vehicle}} is in quality control.",
        ),
        JobStatus::QcComplete => (
            "Quality Control Passed",
            "Your {{vehicle}} has passed quality control.",
        ),
        JobStatus::WaitingDetail => (
            "Final Detail",
            "Your {{vehicle}} is being detailed.",
        ),
        JobStatus::DetailComplete => (
            "Detail Complete",
            "Detailing of your {{vehicle}} is complete.",
        ),
        JobStatus::ReadyForPickup => (
            "Ready for Pickup",
            "Your {{vehicle}} (job {{job_number}}) is ready for pickup.",
        ),
        JobStatus::Completed => (
            "Job Complete",
            "Job {{job_number}} for your {{vehicle}} is complete.",
        ),
        JobStatus::Invoiced => (
            "Invoice Sent",
            "The invoice for job {{job_number}} has been sent.",
        ),
        JobStatus::Paid => (
            "Payment Received",
            "Payment for job {{job_number}} has been received. Thank you!",
        ),
    }
}
