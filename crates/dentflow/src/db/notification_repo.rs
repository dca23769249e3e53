//! In-app notification repository.
//!
//! Rows are created by the notification orchestrator and mutated only by
//! the read/dismiss operations. They are retained indefinitely.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// An in-app notification record.
#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub customer_id: String,
    pub job_id: Option<String>,
    /// Type tag, e.g. "status_change".
    pub kind: String,
    pub title: String,
    pub body: String,
    pub priority: String,
    pub read: bool,
    pub dismissed: bool,
    pub created_at: String,
    pub read_at: Option<String>,
}

impl NotificationRow {
    /// Builds an unread status-change notification.
    pub fn status_change(
        customer_id: &str,
        job_id: Option<&str>,
        title: &str,
        body: &str,
        priority: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            job_id: job_id.map(|s| s.to_string()),
            kind: "status_change".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            priority: priority.to_string(),
            read: false,
            dismissed: false,
            created_at: Utc::now().to_rfc3339(),
            read_at: None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            customer_id: row.get("customer_id")?,
            job_id: row.get("job_id")?,
            kind: row.get("kind")?,
            title: row.get("title")?,
            body: row.get("body")?,
            priority: row.get("priority")?,
            read: row.get("read")?,
            dismissed: row.get("dismissed")?,
            created_at: row.get("created_at")?,
            read_at: row.get("read_at")?,
        })
    }
}

/// Inserts a notification row.
pub fn insert(db: &Database, n: &NotificationRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO notifications (id, customer_id, job_id, kind, title, body,
             priority, read, dismissed, created_at, read_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                n.id,
                n.customer_id,
                n.job_id,
                n.kind,
                n.title,
                n.body,
                n.priority,
                n.read,
                n.dismissed,
                n.created_at,
                n.read_at,
            ],
        )?;
        Ok(())
    })
}

/// Lists notifications for a customer, newest first. Dismissed rows are
/// excluded unless `include_dismissed` is set.
pub fn list_for_customer(
    db: &Database,
    customer_id: &str,
    include_dismissed: bool,
    limit: u64,
) -> Result<Vec<NotificationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = if include_dismissed {
            "SELECT * FROM notifications WHERE customer_id = ?1
             ORDER BY created_at DESC LIMIT ?2"
        } else {
            "SELECT * FROM notifications WHERE customer_id = ?1 AND dismissed = 0
             ORDER BY created_at DESC LIMIT ?2"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows: Vec<NotificationRow> = stmt
            .query_map(params![customer_id, limit as i64], NotificationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts unread, undismissed notifications for a customer.
pub fn unread_count(db: &Database, customer_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE customer_id = ?1 AND read = 0 AND dismissed = 0",
            params![customer_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Marks a single notification as read. Returns whether a row was updated.
pub fn mark_read(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE notifications SET read = 1, read_at = ?2 WHERE id = ?1 AND read = 0",
            params![id, Utc::now().to_rfc3339()],
        )?;
        Ok(updated > 0)
    })
}

/// Marks all of a customer's notifications as read. Returns the count updated.
pub fn mark_all_read(db: &Database, customer_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE notifications SET read = 1, read_at = ?2
             WHERE customer_id = ?1 AND read = 0",
            params![customer_id, Utc::now().to_rfc3339()],
        )?;
        Ok(updated as u64)
    })
}

/// Dismisses a notification. The row is kept for retention.
pub fn dismiss(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE notifications SET dismissed = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(updated > 0)
    })
}

/// Counts all notifications for a customer, including dismissed ones.
pub fn count_for_customer(db: &Database, customer_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE customer_id = ?1",
            params![customer_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
