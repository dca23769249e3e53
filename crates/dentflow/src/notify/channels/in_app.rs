//! In-app channel: persists a notification record.

use crate::db::notification_repo::{self, NotificationRow};
use crate::db::Database;

/// Writes in-app notification rows. Succeeds iff the database write does.
#[derive(Clone)]
pub struct InAppDispatcher {
    db: Database,
}

impl InAppDispatcher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persists a status-change notification. Returns the new row's id on
    /// success, `None` on failure (logged, never raised).
    pub fn dispatch(
        &self,
        customer_id: &str,
        job_id: Option<&str>,
        title: &str,
        body: &str,
        priority: &str,
    ) -> Option<String> {
        let row = NotificationRow::status_change(customer_id, job_id, title, body, priority);
        match notification_repo::insert(&self.db, &row) {
            Ok(()) => {
                log::debug!("Stored in-app notification {} for {}", row.id, customer_id);
                Some(row.id)
            }
            Err(e) => {
                log::error!("Failed to store in-app notification for {}: {}", customer_id, e);
                None
            }
        }
    }
}
