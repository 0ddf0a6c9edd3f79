use std::env;

use crate::services::security::generate_random_string;

#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth platform that issues bearer tokens
    pub jwt_secret: String,
    pub jwt_audience: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("PORTAL_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("PORTAL_JWT_SECRET not set, generating temporary secret");
                generate_random_string(64)
            });

        Self {
            jwt_secret,
            jwt_audience: env::var("PORTAL_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".to_string()),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("jwt_audience", &self.jwt_audience)
            .finish()
    }
}
