//! Push subscription repository — per-customer web-push device endpoints.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A stored web-push subscription.
#[derive(Debug, Clone)]
pub struct PushSubscriptionRow {
    pub id: String,
    pub customer_id: String,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
    pub active: bool,
    pub created_at: String,
}

impl PushSubscriptionRow {
    /// Builds a new active subscription.
    pub fn new(customer_id: &str, endpoint: &str, p256dh_key: &str, auth_key: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            endpoint: endpoint.to_string(),
            p256dh_key: p256dh_key.to_string(),
            auth_key: auth_key.to_string(),
            active: true,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            customer_id: row.get("customer_id")?,
            endpoint: row.get("endpoint")?,
            p256dh_key: row.get("p256dh_key")?,
            auth_key: row.get("auth_key")?,
            active: row.get("active")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a subscription row.
pub fn insert(db: &Database, sub: &PushSubscriptionRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO push_subscriptions (id, customer_id, endpoint, p256dh_key,
             auth_key, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sub.id,
                sub.customer_id,
                sub.endpoint,
                sub.p256dh_key,
                sub.auth_key,
                sub.active,
                sub.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Returns a customer's active subscriptions.
pub fn active_for_customer(
    db: &Database,
    customer_id: &str,
) -> Result<Vec<PushSubscriptionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM push_subscriptions WHERE customer_id = ?1 AND active = 1
             ORDER BY created_at ASC",
        )?;
        let rows: Vec<PushSubscriptionRow> = stmt
            .query_map(params![customer_id], PushSubscriptionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deactivates a subscription (e.g. the provider reported it gone).
pub fn deactivate(db: &Database, id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE push_subscriptions SET active = 0 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    })
}
