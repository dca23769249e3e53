//! Template repository — versioned channel templates and usage analytics.
//!
//! Templates are keyed by (template_key, channel, version). At most one
//! version per key+channel is active at a time; authoring a new version
//! deactivates the previous ones in the same transaction. Versions are
//! never deleted.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A stored template version.
#[derive(Debug, Clone)]
pub struct TemplateRow {
    pub id: i64,
    pub template_key: String,
    pub channel: String,
    pub version: i64,
    /// Email subject line. Unused by other channels.
    pub subject: Option<String>,
    /// Push / in-app title. Unused by email and SMS.
    pub title: Option<String>,
    pub body: String,
    pub active: bool,
    pub created_at: String,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            template_key: row.get("template_key")?,
            channel: row.get("channel")?,
            version: row.get("version")?,
            subject: row.get("subject")?,
            title: row.get("title")?,
            body: row.get("body")?,
            active: row.get("active")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Creates a new template version for (key, channel), activates it, and
/// deactivates any previous versions. Returns the new version number.
pub fn create_version(
    db: &Database,
    template_key: &str,
    channel: &str,
    subject: Option<&str>,
    title: Option<&str>,
    body: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let next_version: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM templates
             WHERE template_key = ?1 AND channel = ?2",
            params![template_key, channel],
            |r| r.get(0),
        )?;

        tx.execute(
            "UPDATE templates SET active = 0 WHERE template_key = ?1 AND channel = ?2",
            params![template_key, channel],
        )?;

        tx.execute(
            "INSERT INTO templates (template_key, channel, version, subject, title, body,
             active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                template_key,
                channel,
                next_version,
                subject,
                title,
                body,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        log::debug!(
            "Stored template {} v{} for channel {}",
            template_key,
            next_version,
            channel
        );
        Ok(next_version)
    })
}

/// Returns the active template for (key, channel), highest version first.
pub fn get_active(
    db: &Database,
    template_key: &str,
    channel: &str,
) -> Result<Option<TemplateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM templates WHERE template_key = ?1 AND channel = ?2 AND active = 1
             ORDER BY version DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![template_key, channel], TemplateRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists every stored version for (key, channel), oldest first.
pub fn list_versions(
    db: &Database,
    template_key: &str,
    channel: &str,
) -> Result<Vec<TemplateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM templates WHERE template_key = ?1 AND channel = ?2
             ORDER BY version ASC",
        )?;
        let rows: Vec<TemplateRow> = stmt
            .query_map(params![template_key, channel], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deactivates the custom template for (key, channel), falling back to the
/// built-in default.
pub fn deactivate(db: &Database, template_key: &str, channel: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE templates SET active = 0 WHERE template_key = ?1 AND channel = ?2",
            params![template_key, channel],
        )?;
        Ok(())
    })
}

/// Records that a template was rendered for a customer. Returns the usage id.
pub fn record_usage(
    db: &Database,
    template_key: &str,
    channel: &str,
    customer_id: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO template_usage (template_key, channel, customer_id, sent_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![template_key, channel, customer_id, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Marks a usage entry as opened.
pub fn mark_opened(db: &Database, usage_id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE template_usage SET opened = 1 WHERE id = ?1",
            params![usage_id],
        )?;
        Ok(())
    })
}

/// Marks a usage entry as clicked.
pub fn mark_clicked(db: &Database, usage_id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE template_usage SET clicked = 1 WHERE id = ?1",
            params![usage_id],
        )?;
        Ok(())
    })
}

/// Counts usage entries for (key, channel).
pub fn usage_count(
    db: &Database,
    template_key: &str,
    channel: &str,
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM template_usage WHERE template_key = ?1 AND channel = ?2",
            params![template_key, channel],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
