//! Job repository — CRUD operations for the `jobs` table.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub job_number: String,
    pub status: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub vehicle_description: Option<String>,
    pub assigned_tech: Option<String>,
    pub priority: String,
    pub parts_status: Option<String>,
    pub scheduled_drop_off: Option<String>,
    pub actual_drop_off: Option<String>,
    pub scheduled_pickup: Option<String>,
    pub actual_pickup: Option<String>,
    pub completed_at: Option<String>,
    pub status_changed_at: Option<String>,
    pub status_changed_by: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_number: row.get("job_number")?,
            status: row.get("status")?,
            customer_id: row.get("customer_id")?,
            customer_name: row.get("customer_name")?,
            customer_email: row.get("customer_email")?,
            customer_phone: row.get("customer_phone")?,
            vehicle_description: row.get("vehicle_description")?,
            assigned_tech: row.get("assigned_tech")?,
            priority: row.get("priority")?,
            parts_status: row.get("parts_status")?,
            scheduled_drop_off: row.get("scheduled_drop_off")?,
            actual_drop_off: row.get("actual_drop_off")?,
            scheduled_pickup: row.get("scheduled_pickup")?,
            actual_pickup: row.get("actual_pickup")?,
            completed_at: row.get("completed_at")?,
            status_changed_at: row.get("status_changed_at")?,
            status_changed_by: row.get("status_changed_by")?,
            deleted: row.get("deleted")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub assigned_tech: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| Ok(insert_tx(conn, job)?))
}

/// Inserts a job row inside an existing transaction.
pub(crate) fn insert_tx(conn: &Connection, job: &JobRow) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO jobs (id, job_number, status, customer_id, customer_name,
         customer_email, customer_phone, vehicle_description, assigned_tech, priority,
         parts_status, scheduled_drop_off, actual_drop_off, scheduled_pickup,
         actual_pickup, completed_at, status_changed_at, status_changed_by, deleted,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
         ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            job.id,
            job.job_number,
            job.status,
            job.customer_id,
            job.customer_name,
            job.customer_email,
            job.customer_phone,
            job.vehicle_description,
            job.assigned_tech,
            job.priority,
            job.parts_status,
            job.scheduled_drop_off,
            job.actual_drop_off,
            job.scheduled_pickup,
            job.actual_pickup,
            job.completed_at,
            job.status_changed_at,
            job.status_changed_by,
            job.deleted,
            job.created_at,
            job.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds a job by its ID, including soft-deleted rows.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Finds a non-deleted job by its ID.
pub fn find_active(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1 AND deleted = 0")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries jobs with filters, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if !filter.include_deleted {
            conditions.push("deleted = 0".to_string());
        }
        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref customer_id) = filter.customer_id {
            conditions.push(format!("customer_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(customer_id.clone()));
        }
        if let Some(ref assigned_tech) = filter.assigned_tech {
            conditions.push(format!("assigned_tech = ?{}", param_values.len() + 1));
            param_values.push(Box::new(assigned_tech.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Count total matching rows.
        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        // Fetch paginated results.
        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Counts non-deleted jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1 AND deleted = 0",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Soft-marks a job as deleted. Jobs are never removed from the table.
pub fn soft_delete(db: &Database, id: &str, at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET deleted = 1, updated_at = ?2 WHERE id = ?1",
            params![id, at],
        )?;
        Ok(())
    })
}

// Connection-level helpers used inside the transition transaction.

/// Updates the status bookkeeping columns of a job.
pub(crate) fn update_status_tx(
    conn: &Connection,
    id: &str,
    status: &str,
    changed_at: &str,
    changed_by: Option<&str>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE jobs SET status = ?2, status_changed_at = ?3, status_changed_by = ?4,
         updated_at = ?3 WHERE id = ?1",
        params![id, status, changed_at, changed_by],
    )?;
    Ok(())
}

/// Stamps the actual drop-off time if not already set.
pub(crate) fn stamp_drop_off_tx(
    conn: &Connection,
    id: &str,
    at: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE jobs SET actual_drop_off = COALESCE(actual_drop_off, ?2) WHERE id = ?1",
        params![id, at],
    )?;
    Ok(())
}

/// Stamps the actual pickup and completion times together if not already set.
pub(crate) fn stamp_completion_tx(
    conn: &Connection,
    id: &str,
    at: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE jobs SET actual_pickup = COALESCE(actual_pickup, ?2),
         completed_at = COALESCE(completed_at, ?2) WHERE id = ?1",
        params![id, at],
    )?;
    Ok(())
}
