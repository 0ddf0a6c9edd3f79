use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::user_role::AppRole;

// JWT token expiration time (in seconds)
const ACCESS_TOKEN_EXPIRE: i64 = 3600; // 1 hour

/// `role` claim carried by tokens issued to scheduled jobs and other backends
pub const SERVICE_ROLE: &str = "service_role";

/// JWT token claims as issued by the auth platform
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // Subject (profile id), absent on service tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // "authenticated" or "service_role"
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn is_service(&self) -> bool {
        self.role.as_deref() == Some(SERVICE_ROLE)
    }
}

/// Identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// A signed-in portal user with their roles
    User { id: Uuid, roles: Vec<AppRole> },
    /// Scheduled jobs and trusted backends
    Service,
}

impl Caller {
    pub fn user(id: Uuid, roles: Vec<AppRole>) -> Self {
        Caller::User { id, roles }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Caller::User { id, .. } => Some(*id),
            Caller::Service => None,
        }
    }

    pub fn has_role(&self, role: AppRole) -> bool {
        match self {
            Caller::User { roles, .. } => roles.contains(&role),
            Caller::Service => false,
        }
    }

    /// Admins and the service identity may act on other users' behalf
    pub fn is_elevated(&self) -> bool {
        matches!(self, Caller::Service) || self.has_role(AppRole::Admin)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            Caller::User { roles, .. } => roles
                .iter()
                .any(|role| role.permissions().contains(&permission)),
            Caller::Service => true,
        }
    }
}

/// Create a signed access token for a profile (or the service identity when
/// `subject` is `None`)
pub fn create_access_token(
    subject: Option<&str>,
    role: Option<&str>,
    expires_in: Option<i64>,
) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expires_in.unwrap_or(ACCESS_TOKEN_EXPIRE));

    let claims = Claims {
        sub: subject.map(String::from),
        aud: subject.map(|_| CONFIG.auth.jwt_audience.clone()),
        email: None,
        role: Some(role.unwrap_or("authenticated").to_string()),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(CONFIG.auth.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| e.into())
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str) -> Result<Claims> {
    let key = DecodingKey::from_secret(CONFIG.auth.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // Service tokens carry no audience; user tokens are checked below
    validation.validate_aud = false;

    let claims = decode::<Claims>(token, &key, &validation)?.claims;

    if !claims.is_service() && claims.aud.as_deref() != Some(CONFIG.auth.jwt_audience.as_str()) {
        return Err(AppError::Unauthorized("Invalid token audience".to_string()));
    }

    Ok(claims)
}

/// Generate a random alphanumeric string
pub fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
