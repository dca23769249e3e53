//! Notification preference repository — one row per customer.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Status codes that trigger notification when no preference row exists.
///
/// Kept as literal codes rather than typed statuses: stored preference sets
/// are tolerant of codes outside the current workflow enum (e.g. legacy
/// `SCHEDULED` entries), which simply never match.
pub const DEFAULT_NOTIFY_STATUSES: &[&str] = &[
    "APPROVED",
    "SCHEDULED",
    "IN_PROGRESS",
    "READY_FOR_PICKUP",
    "COMPLETED",
];

/// Per-customer notification settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRow {
    pub customer_id: String,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,
    pub in_app_enabled: bool,
    /// Status codes that trigger notification.
    pub notify_statuses: BTreeSet<String>,
    /// Quiet hours start, "HH:MM" local time. Both set or both unset.
    pub quiet_hours_start: Option<String>,
    /// Quiet hours end, "HH:MM" local time.
    pub quiet_hours_end: Option<String>,
    pub updated_at: String,
}

impl PreferenceRow {
    /// Default preferences for a customer with no stored row:
    /// email and in-app on, SMS and push off, no quiet hours.
    pub fn defaults(customer_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            email_enabled: true,
            sms_enabled: false,
            push_enabled: false,
            in_app_enabled: true,
            notify_statuses: DEFAULT_NOTIFY_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quiet_hours_start: None,
            quiet_hours_end: None,
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Whether the given status code should trigger a notification.
    pub fn notifies_on(&self, status_code: &str) -> bool {
        self.notify_statuses.contains(status_code)
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let notify_json: String = row.get("notify_statuses")?;
        let notify_statuses: BTreeSet<String> =
            serde_json::from_str(&notify_json).unwrap_or_else(|e| {
                log::warn!("Malformed notify_statuses '{}': {}", notify_json, e);
                BTreeSet::new()
            });
        Ok(Self {
            customer_id: row.get("customer_id")?,
            email_enabled: row.get("email_enabled")?,
            sms_enabled: row.get("sms_enabled")?,
            push_enabled: row.get("push_enabled")?,
            in_app_enabled: row.get("in_app_enabled")?,
            notify_statuses,
            quiet_hours_start: row.get("quiet_hours_start")?,
            quiet_hours_end: row.get("quiet_hours_end")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Returns the preferences for a customer, lazily creating a defaulted row
/// on first read.
pub fn get(db: &Database, customer_id: &str) -> Result<PreferenceRow, DatabaseError> {
    if let Some(existing) = find(db, customer_id)? {
        return Ok(existing);
    }

    let defaults = PreferenceRow::defaults(customer_id);
    set(db, &defaults)?;
    Ok(defaults)
}

/// Returns the stored preferences for a customer, if any.
pub fn find(db: &Database, customer_id: &str) -> Result<Option<PreferenceRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM notification_preferences WHERE customer_id = ?1")?;
        let mut rows = stmt.query_map(params![customer_id], PreferenceRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Upserts a preference row. Last write wins.
pub fn set(db: &Database, pref: &PreferenceRow) -> Result<(), DatabaseError> {
    let notify_json = serde_json::to_string(&pref.notify_statuses).unwrap_or_else(|e| {
        log::warn!("Failed to serialize notify_statuses: {}", e);
        "[]".to_string()
    });
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO notification_preferences (customer_id, email_enabled, sms_enabled,
             push_enabled, in_app_enabled, notify_statuses, quiet_hours_start,
             quiet_hours_end, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(customer_id) DO UPDATE SET
                 email_enabled = excluded.email_enabled,
                 sms_enabled = excluded.sms_enabled,
                 push_enabled = excluded.push_enabled,
                 in_app_enabled = excluded.in_app_enabled,
                 notify_statuses = excluded.notify_statuses,
                 quiet_hours_start = excluded.quiet_hours_start,
                 quiet_hours_end = excluded.quiet_hours_end,
                 updated_at = excluded.updated_at",
            params![
                pref.customer_id,
                pref.email_enabled,
                pref.sms_enabled,
                pref.push_enabled,
                pref.in_app_enabled,
                notify_json,
                pref.quiet_hours_start,
                pref.quiet_hours_end,
                pref.updated_at,
            ],
        )?;
        Ok(())
    })
}
