use std::env;

/// VAPID identity of this server, shared by every push delivery.
#[derive(Clone)]
pub struct VapidConfig {
    /// Public key (base64 URL-safe, uncompressed P-256 point)
    pub public_key: String,
    /// Private key (base64 URL-safe, raw P-256 scalar)
    pub private_key: String,
    /// Contact URI (`mailto:` or `https:`)
    pub subject: String,
}

impl std::fmt::Debug for VapidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"***")
            .field("subject", &self.subject)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub vapid: Option<VapidConfig>,
    pub ttl_secs: u32,
    pub timeout_secs: u64,
    pub default_icon: String,
    pub default_badge: String,
}

impl PushConfig {
    pub fn from_env() -> Self {
        let public_key = env::var("PORTAL_VAPID_PUBLIC_KEY").ok().filter(|s| !s.is_empty());
        let private_key = env::var("PORTAL_VAPID_PRIVATE_KEY").ok().filter(|s| !s.is_empty());

        let vapid = match (public_key, private_key) {
            (Some(public_key), Some(private_key)) => Some(VapidConfig {
                public_key,
                private_key,
                subject: env::var("PORTAL_VAPID_SUBJECT")
                    .unwrap_or_else(|_| "mailto:admin@example.com".to_string()),
            }),
            _ => None,
        };

        Self {
            vapid,
            ttl_secs: env::var("PORTAL_PUSH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86400),
            timeout_secs: env::var("PORTAL_PUSH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            default_icon: env::var("PORTAL_PUSH_DEFAULT_ICON")
                .unwrap_or_else(|_| "/icon-192.png".to_string()),
            default_badge: env::var("PORTAL_PUSH_DEFAULT_BADGE")
                .unwrap_or_else(|_| "/badge-72.png".to_string()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.vapid.is_some()
    }
}
