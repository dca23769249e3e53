//! SMS send log — backs the per-destination rate limit.

use rusqlite::params;

use super::{Database, DatabaseError};

/// Records a successful send to a destination number.
pub fn record_send(db: &Database, destination: &str, at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO sms_log (destination, sent_at) VALUES (?1, ?2)",
            params![destination, at],
        )?;
        Ok(())
    })
}

/// Counts sends to a destination at or after the given timestamp.
///
/// Timestamps are RFC3339 strings, so lexical comparison matches
/// chronological order.
pub fn count_since(db: &Database, destination: &str, since: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM sms_log WHERE destination = ?1 AND sent_at >= ?2",
            params![destination, since],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
