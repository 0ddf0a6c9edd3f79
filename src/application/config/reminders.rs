use std::env;

#[derive(Debug, Clone)]
pub struct RemindersConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl RemindersConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PORTAL_REMINDERS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            interval_secs: env::var("PORTAL_REMINDERS_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(3600),
        }
    }
}
