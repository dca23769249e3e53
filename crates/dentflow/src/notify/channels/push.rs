//! Web-push channel adapter.

use std::sync::Arc;

use crate::db::{subscription_repo, Database};

use super::{PushSender, SendError};

/// Fans a push message out to every active subscription of a customer.
#[derive(Clone)]
pub struct PushDispatcher {
    db: Database,
    sender: Option<Arc<dyn PushSender>>,
}

impl PushDispatcher {
    pub fn new(db: Database, sender: Option<Arc<dyn PushSender>>) -> Self {
        Self { db, sender }
    }

    /// Attempts delivery to each active subscription independently.
    /// A subscription the provider reports gone is deactivated. Returns
    /// `true` if at least one subscription accepted the message.
    pub fn dispatch(&self, customer_id: &str, title: &str, body: &str) -> bool {
        let Some(sender) = &self.sender else {
            log::debug!("Push dispatch skipped: no provider configured");
            return false;
        };

        let subscriptions = match subscription_repo::active_for_customer(&self.db, customer_id) {
            Ok(subs) => subs,
            Err(e) => {
                log::error!("Failed to load push subscriptions for {}: {}", customer_id, e);
                return false;
            }
        };
        if subscriptions.is_empty() {
            log::debug!("Push dispatch skipped: no active subscriptions for {}", customer_id);
            return false;
        }

        let mut delivered = 0usize;
        for sub in &subscriptions {
            match sender.send(sub, title, body) {
                Ok(()) => delivered += 1,
                Err(SendError::Gone) => {
                    log::info!("Push subscription {} is gone, deactivating", sub.id);
                    if let Err(e) = subscription_repo::deactivate(&self.db, &sub.id) {
                        log::warn!("Failed to deactivate subscription {}: {}", sub.id, e);
                    }
                }
                Err(e) => {
                    log::warn!("Push to subscription {} failed: {}", sub.id, e);
                }
            }
        }

        if delivered > 0 {
            log::info!(
                "Push sent to {}/{} subscriptions for {}",
                delivered,
                subscriptions.len(),
                customer_id
            );
        }
        delivered > 0
    }
}
