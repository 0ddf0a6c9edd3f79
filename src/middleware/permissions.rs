//! Permission system with type-safe authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::{Authorized, permissions::*};
//!
//! async fn list_history(
//!     Authorized(caller, _): Authorized<NotificationsView>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<HistoryResponse>> {
//!     // Permission already verified
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::security::Caller;

/// Trait for permission marker types
pub trait Permission: Send + Sync + 'static {
    /// The permission string (e.g., "notifications.view")
    const NAME: &'static str;
}

/// Macro to define permission types
///
/// Creates zero-sized marker types that implement `Permission`
macro_rules! define_permissions {
    ($($(#[$meta:meta])* $name:ident => $perm:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const NAME: &'static str = $perm;
            }
        )*
    };
}

define_permissions! {
    /// Send push notifications to other users
    NotificationsSend => "notifications.send",
    /// View notification history
    NotificationsView => "notifications.view",
    /// Purge notification history
    NotificationsManage => "notifications.manage",
    /// Trigger the medication reminder sweep
    RemindersRun => "reminders.run",
}

fn authenticated_user(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

fn require_user_id(caller: &Caller) -> Result<Uuid, AppError> {
    caller
        .user_id()
        .ok_or_else(|| AppError::Forbidden("A user token is required".to_string()))
}

/// Extractor that requires a specific permission
///
/// If the permission check fails, a 403 Forbidden error is returned
/// before the handler runs.
#[derive(Debug, Clone)]
pub struct Authorized<P: Permission>(pub Caller, pub PhantomData<P>);

impl<P: Permission> Authorized<P> {
    pub fn caller(&self) -> &Caller {
        &self.0
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = authenticated_user(parts)?;

        if !auth_user.has_permission(P::NAME) {
            return Err(AppError::Forbidden(format!(
                "Permission denied: {} required",
                P::NAME
            )));
        }

        Ok(Authorized(auth_user.caller.clone(), PhantomData))
    }
}

/// Extractor for any authenticated caller (no specific permission required)
#[derive(Debug, Clone)]
pub struct Authenticated(pub Caller);

impl Authenticated {
    pub fn caller(&self) -> &Caller {
        &self.0
    }

    /// The caller's profile id; the service identity has none
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        require_user_id(&self.0)
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = authenticated_user(parts)?;

        Ok(Authenticated(auth_user.caller.clone()))
    }
}
