use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::endpoints::extractors::ValidatedJson;
use crate::error::{AppError, Result};
use crate::middleware::permissions::Authenticated;
use crate::models::push_subscription;
use crate::services::subscriptions::SubscriptionKeys;
use crate::state::AppState;

/// Create subscription routes
pub fn subscription_routes(state: AppState) -> Router {
    Router::new()
        .route("/vapid-public-key", get(get_vapid_public_key))
        .route(
            "/subscriptions",
            get(list_subscriptions)
                .post(subscribe)
                .delete(unsubscribe),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SubscribeRequest {
    #[validate(url(message = "endpoint must be a URL"))]
    pub endpoint: String,
    #[validate(nested)]
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UnsubscribeRequest {
    #[validate(length(min = 1, message = "endpoint is required"))]
    pub endpoint: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub endpoint: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<push_subscription::Model> for SubscriptionResponse {
    fn from(s: push_subscription::Model) -> Self {
        Self {
            id: s.id,
            endpoint: s.endpoint,
            user_agent: s.user_agent,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UnsubscribeResponse {
    pub success: bool,
    pub removed: bool,
}

/// Public VAPID key browsers need to create a subscription
#[utoipa::path(
    get,
    path = "/api/push/vapid-public-key",
    tag = "Push",
    responses(
        (status = 200, body = VapidKeyResponse),
        (status = 503, description = "Push is not configured")
    )
)]
async fn get_vapid_public_key(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<VapidKeyResponse>> {
    let public_key = state.vapid_public_key.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Push notifications are not configured".to_string())
    })?;

    Ok(Json(VapidKeyResponse { public_key }))
}

/// List the caller's own subscriptions
#[utoipa::path(
    get,
    path = "/api/push/subscriptions",
    tag = "Push",
    responses((status = 200, body = Vec<SubscriptionResponse>))
)]
async fn list_subscriptions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    let subscriptions = state.subscriptions.list(auth.user_id()?).await?;
    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// Register (or refresh) a browser subscription for the caller
#[utoipa::path(
    post,
    path = "/api/push/subscriptions",
    tag = "Push",
    request_body = SubscribeRequest,
    responses((status = 200, body = SubscriptionResponse))
)]
async fn subscribe(
    State(state): State<AppState>,
    auth: Authenticated,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<SubscribeRequest>,
) -> Result<Json<SubscriptionResponse>> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let subscription = state
        .subscriptions
        .upsert(auth.user_id()?, &request.endpoint, &request.keys, user_agent)
        .await?;

    tracing::info!(user_id = %subscription.user_id, "Push subscription registered");

    Ok(Json(subscription.into()))
}

/// Remove one of the caller's subscriptions
#[utoipa::path(
    delete,
    path = "/api/push/subscriptions",
    tag = "Push",
    request_body = UnsubscribeRequest,
    responses((status = 200, body = UnsubscribeResponse))
)]
async fn unsubscribe(
    State(state): State<AppState>,
    auth: Authenticated,
    ValidatedJson(request): ValidatedJson<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>> {
    let removed = state
        .subscriptions
        .remove(auth.user_id()?, &request.endpoint)
        .await?;

    Ok(Json(UnsubscribeResponse {
        success: true,
        removed,
    }))
}
