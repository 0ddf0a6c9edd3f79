//! Authentication middleware for API routes
//!
//! Requires a valid Bearer token on every route it wraps. Public routes
//! (health, version) are mounted outside of it.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::prelude::*;
use crate::models::user_role::AppRole;
use crate::models::{profile, user_role};
use crate::services::security::{decode_token, Caller};
use crate::state::AppState;

/// Authenticated caller stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub caller: Caller,
    /// `None` for the service identity
    pub profile: Option<profile::Model>,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.caller.has_permission(permission)
    }
}

/// Auth middleware that validates Bearer tokens
///
/// Returns 401 Unauthorized if token is missing or invalid.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Extract Bearer token from Authorization header
    let token = match extract_bearer_token(&req) {
        Some(t) => t,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let user = match authenticate(&state, &token).await {
        Ok(u) => u,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    req.extensions_mut().insert(user);

    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

/// Validate JWT token and resolve the caller's profile and roles
async fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, String> {
    let claims = decode_token(token).map_err(|_| "Invalid or expired token".to_string())?;

    if claims.is_service() {
        return Ok(AuthenticatedUser {
            caller: Caller::Service,
            profile: None,
        });
    }

    let user_id: Uuid = claims
        .sub
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "Invalid token subject".to_string())?;

    let profile = Profile::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    let roles = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(&state.db)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .iter()
        .filter_map(|r| AppRole::parse(&r.role))
        .collect();

    Ok(AuthenticatedUser {
        caller: Caller::user(user_id, roles),
        profile: Some(profile),
    })
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "detail": message
        })),
    )
        .into_response()
}
