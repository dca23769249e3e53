//! Template rendering: `{{variable}}` substitution and built-in defaults.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::db::template_repo::TemplateRow;

/// A notification delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Sms,
    Push,
    InApp,
}

/// Every channel, in dispatch order.
pub const ALL_CHANNELS: &[Channel] = &[Channel::InApp, Channel::Email, Channel::Sms, Channel::Push];

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
            Channel::InApp => "in_app",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            "in_app" => Ok(Channel::InApp),
            _ => Err(()),
        }
    }
}

/// Channel-shaped template content, raw or rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateContent {
    Email { subject: String, body: String },
    Sms { body: String },
    Push { title: String, body: String },
    InApp { title: String, body: String },
}

impl TemplateContent {
    pub fn channel(&self) -> Channel {
        match self {
            TemplateContent::Email { .. } => Channel::Email,
            TemplateContent::Sms { .. } => Channel::Sms,
            TemplateContent::Push { .. } => Channel::Push,
            TemplateContent::InApp { .. } => Channel::InApp,
        }
    }

    /// Substitutes the variable bag into every text field.
    pub fn render(&self, vars: &HashMap<String, String>) -> TemplateContent {
        match self {
            TemplateContent::Email { subject, body } => TemplateContent::Email {
                subject: render(subject, vars),
                body: render(body, vars),
            },
            TemplateContent::Sms { body } => TemplateContent::Sms {
                body: render(body, vars),
            },
            TemplateContent::Push { title, body } => TemplateContent::Push {
                title: render(title, vars),
                body: render(body, vars),
            },
            TemplateContent::InApp { title, body } => TemplateContent::InApp {
                title: render(title, vars),
                body: render(body, vars),
            },
        }
    }

    /// Reshapes a stored template row into channel-shaped content.
    /// Returns `None` for an unrecognized channel code.
    pub fn from_stored(row: &TemplateRow) -> Option<TemplateContent> {
        let channel: Channel = row.channel.parse().ok()?;
        Some(match channel {
            Channel::Email => TemplateContent::Email {
                subject: row.subject.clone().unwrap_or_default(),
                body: row.body.clone(),
            },
            Channel::Sms => TemplateContent::Sms {
                body: row.body.clone(),
            },
            Channel::Push => TemplateContent::Push {
                title: row.title.clone().unwrap_or_default(),
                body: row.body.clone(),
            },
            Channel::InApp => TemplateContent::InApp {
                title: row.title.clone().unwrap_or_default(),
                body: row.body.clone(),
            },
        })
    }
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("token pattern is valid")
    })
}

/// Replaces every `{{identifier}}` token with its value from the bag.
/// Unknown identifiers render as empty string; no token is ever left behind.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    token_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Built-in default content for a template key + channel.
///
/// Stored custom templates take precedence; these are the fallbacks that
/// ship with the crate.
pub fn builtin(key: &str, channel: Channel) -> Option<TemplateContent> {
    let content = match (key, channel) {
        ("JOB_APPROVED", Channel::Email) => TemplateContent::Email {
            subject: "Estimate approved - {{job_number}}".to_string(),
            body: "Hi {{customer_name}},\n\nGreat news! The repair estimate for your \
                   {{vehicle}} has been approved and work will begin soon.\n\n\
                   Job number: {{job_number}}\n{{notes}}\n\n\
                   Questions? Call us at {{phone_number}}.\n\n{{company_name}}"
                .to_string(),
        },
        ("JOB_APPROVED", Channel::Sms) => TemplateContent::Sms {
            body: "{{company_name}}: estimate approved for your {{vehicle}} \
                   ({{job_number}}). Repairs will begin soon."
                .to_string(),
        },
        ("JOB_APPROVED", Channel::Push) => TemplateContent::Push {
            title: "Estimate Approved".to_string(),
            body: "Repairs on your {{vehicle}} will begin soon".to_string(),
        },
        ("JOB_APPROVED", Channel::InApp) => TemplateContent::InApp {
            title: "Estimate Approved".to_string(),
            body: "The estimate for your {{vehicle}} ({{job_number}}) has been approved."
                .to_string(),
        },

        ("JOB_IN_PROGRESS", Channel::Email) => TemplateContent::Email {
            subject: "Repairs underway on your {{vehicle}}".to_string(),
            body: "Hi {{customer_name}},\n\nOur technicians have started work on your \
                   {{vehicle}}.\n\nJob number: {{job_number}}\n{{notes}}\n\n\
                   {{company_name}}"
                .to_string(),
        },
        ("JOB_IN_PROGRESS", Channel::Sms) => TemplateContent::Sms {
            body: "{{company_name}}: repairs have started on your {{vehicle}} \
                   ({{job_number}})."
                .to_string(),
        },
        ("JOB_IN_PROGRESS", Channel::Push) => TemplateContent::Push {
            title: "Repair Started".to_string(),
            body: "Work on your {{vehicle}} is underway".to_string(),
        },
        ("JOB_IN_PROGRESS", Channel::InApp) => TemplateContent::InApp {
            title: "Repair In Progress".to_string(),
            body: "Our technicians are working on your {{vehicle}} ({{job_number}})."
                .to_string(),
        },

        ("JOB_READY_FOR_PICKUP", Channel::Email) => TemplateContent::Email {
            subject: "Your {{vehicle}} is ready for pickup!".to_string(),
            body: "Hi {{customer_name}},\n\nYour {{vehicle}} is repaired and ready for \
                   pickup.\n\nJob number: {{job_number}}\n{{notes}}\n\n\
                   Track your repair: {{portal_url}}\n\n\
                   {{company_name}} - {{phone_number}}"
                .to_string(),
        },
        ("JOB_READY_FOR_PICKUP", Channel::Sms) => TemplateContent::Sms {
            body: "{{company_name}}: your {{vehicle}} is ready for pickup! Job \
                   {{job_number}}. Call {{phone_number}} to arrange a time."
                .to_string(),
        },
        ("JOB_READY_FOR_PICKUP", Channel::Push) => TemplateContent::Push {
            title: "Ready for Pickup".to_string(),
            body: "Your {{vehicle}} is ready to go home".to_string(),
        },
        ("JOB_READY_FOR_PICKUP", Channel::InApp) => TemplateContent::InApp {
            title: "Vehicle Ready for Pickup".to_string(),
            body: "Your {{vehicle}} ({{job_number}}) is ready for pickup.".to_string(),
        },

        ("JOB_COMPLETED", Channel::Email) => TemplateContent::Email {
            subject: "Thanks from {{company_name}}".to_string(),
            body: "Hi {{customer_name}},\n\nYour {{vehicle}} has been picked up and job \
                   {{job_number}} is complete. Thank you for choosing {{company_name}}!\n\n\
                   {{notes}}"
                .to_string(),
        },
        ("JOB_COMPLETED", Channel::Sms) => TemplateContent::Sms {
            body: "{{company_name}}: job {{job_number}} for your {{vehicle}} is complete. \
                   Thank you!"
                .to_string(),
        },
        ("JOB_COMPLETED", Channel::Push) => TemplateContent::Push {
            title: "Job Complete".to_string(),
            body: "Job {{job_number}} is complete. Thank you!".to_string(),
        },
        ("JOB_COMPLETED", Channel::InApp) => TemplateContent::InApp {
            title: "Job Complete".to_string(),
            body: "Job {{job_number}} for your {{vehicle}} is complete.".to_string(),
        },

        _ => return None,
    };
    Some(content)
}
