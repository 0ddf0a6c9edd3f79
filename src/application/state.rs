use std::sync::Arc;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::services::history::NotificationHistory;
use crate::services::preferences::PreferenceService;
use crate::services::push::Dispatcher;
use crate::services::reminders::ReminderSweep;
use crate::services::subscriptions::SubscriptionRegistry;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub subscriptions: SubscriptionRegistry,
    pub history: NotificationHistory,
    pub preferences: PreferenceService,
    /// Present only when a VAPID key pair is configured
    pub dispatcher: Option<Arc<Dispatcher>>,
    pub vapid_public_key: Option<String>,
}

impl AppState {
    pub fn new(
        db: DbConn,
        dispatcher: Option<Arc<Dispatcher>>,
        vapid_public_key: Option<String>,
    ) -> Self {
        Self {
            subscriptions: SubscriptionRegistry::new(db.clone()),
            history: NotificationHistory::new(db.clone()),
            preferences: PreferenceService::new(db.clone()),
            db,
            dispatcher,
            vapid_public_key,
        }
    }

    /// Get the dispatcher (returns error if push is not configured)
    pub fn get_dispatcher(&self) -> Result<Arc<Dispatcher>> {
        self.dispatcher.clone().ok_or_else(|| {
            AppError::ServiceUnavailable("Push notifications are not configured".to_string())
        })
    }

    /// Build a reminder sweep bound to this state's dispatcher
    pub fn reminder_sweep(&self) -> Result<ReminderSweep> {
        Ok(ReminderSweep::new(self.db.clone(), self.get_dispatcher()?))
    }
}
