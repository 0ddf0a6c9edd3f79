pub mod history;
pub mod preferences;
pub mod push;
pub mod reminders;
pub mod scheduler;
pub mod security;
pub mod subscriptions;

pub use history::NotificationHistory;
pub use preferences::{NotificationPreferences, PreferenceService};
pub use push::{Dispatcher, PushTransport, WebPushTransport};
pub use reminders::ReminderSweep;
pub use security::Caller;
pub use subscriptions::SubscriptionRegistry;
