//! Status history repository — append-only audit log for job transitions.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// An immutable audit record of one status change.
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub id: i64,
    pub job_id: String,
    /// `None` for the creation entry.
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by: Option<String>,
    pub note: Option<String>,
    pub forced: bool,
    pub created_at: String,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            from_status: row.get("from_status")?,
            to_status: row.get("to_status")?,
            changed_by: row.get("changed_by")?,
            note: row.get("note")?,
            forced: row.get("forced")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends a history entry inside an existing transaction.
pub(crate) fn append_tx(
    conn: &Connection,
    job_id: &str,
    from_status: Option<&str>,
    to_status: &str,
    changed_by: Option<&str>,
    note: Option<&str>,
    forced: bool,
    created_at: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO status_history (job_id, from_status, to_status, changed_by, note,
         forced, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![job_id, from_status, to_status, changed_by, note, forced, created_at],
    )?;
    Ok(())
}

/// Returns the full history of a job in insertion order.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<HistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM status_history WHERE job_id = ?1 ORDER BY id ASC")?;
        let rows: Vec<HistoryRow> = stmt
            .query_map(params![job_id], HistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns the most recent history entry for a job, if any.
pub fn latest_for_job(db: &Database, job_id: &str) -> Result<Option<HistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM status_history WHERE job_id = ?1 ORDER BY id DESC LIMIT 1")?;
        let mut rows = stmt.query_map(params![job_id], HistoryRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, job_number, customer_id, customer_name, created_at, updated_at)
                 VALUES ('j1', 'JOB-0001', 'c1', 'Jane', '2026-01-01', '2026-01-01')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_append_and_list_in_order() {
        let db = test_db();
        db.with_conn(|conn| {
            append_tx(conn, "j1", None, "NEW", None, None, false, "2026-01-01T00:00:00Z")?;
            append_tx(
                conn,
                "j1",
                Some("NEW"),
                "DROPPED_OFF",
                Some("amy"),
                Some("keys in the box"),
                false,
                "2026-01-02T09:00:00Z",
            )?;
            Ok(())
        })
        .unwrap();

        let entries = list_for_job(&db, "j1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].from_status, None);
        assert_eq!(entries[0].to_status, "NEW");
        assert_eq!(entries[1].from_status.as_deref(), Some("NEW"));
        assert_eq!(entries[1].to_status, "DROPPED_OFF");
        assert_eq!(entries[1].note.as_deref(), Some("keys in the box"));
        assert!(!entries[1].forced);
    }

    #[test]
    fn test_latest_for_job() {
        let db = test_db();
        assert!(latest_for_job(&db, "j1").unwrap().is_none());

        db.with_conn(|conn| {
            append_tx(conn, "j1", None, "NEW", None, None, false, "2026-01-01T00:00:00Z")?;
            append_tx(
                conn,
                "j1",
                Some("NEW"),
                "WAITING_WRITEUP",
                None,
                None,
                false,
                "2026-01-02T00:00:00Z",
            )?;
            Ok(())
        })
        .unwrap();

        let latest = latest_for_job(&db, "j1").unwrap().unwrap();
        assert_eq!(latest.to_status, "WAITING_WRITEUP");
    }

    #[test]
    fn test_forced_flag_is_persisted() {
        let db = test_db();
        db.with_conn(|conn| {
            append_tx(
                conn,
                "j1",
                Some("NEW"),
                "PAID",
                Some("admin"),
                None,
                true,
                "2026-01-01T00:00:00Z",
            )?;
            Ok(())
        })
        .unwrap();

        let entries = list_for_job(&db, "j1").unwrap();
        assert!(entries[0].forced);
    }
}
