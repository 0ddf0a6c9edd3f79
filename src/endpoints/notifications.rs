use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::endpoints::extractors::ValidatedJson;
use crate::error::Result;
use crate::middleware::permissions::{
    Authenticated, Authorized, NotificationsManage, NotificationsView,
};
use crate::services::history::{HistoryQuery, HistoryResponse, NotificationRecordView};
use crate::services::preferences::NotificationPreferences;
use crate::state::AppState;

/// Create notification routes
pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        // Admin history
        .route("/history", get(list_history))
        .route("/history/clear", post(clear_history))
        // Caller's own inbox and settings
        .route("/received", get(list_received))
        .route(
            "/preferences",
            get(get_preferences).put(update_preferences),
        )
        .with_state(state)
}

// ============================================================================
// History
// ============================================================================

/// List dispatch history with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/notifications/history",
    tag = "Notifications",
    params(HistoryQuery),
    responses((status = 200, body = HistoryResponse))
)]
async fn list_history(
    State(state): State<AppState>,
    _auth: Authorized<NotificationsView>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let history = state.history.list(query).await?;
    Ok(Json(history))
}

#[derive(Debug, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct ClearHistoryRequest {
    #[validate(range(min = 0, message = "days must not be negative"))]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ClearHistoryResponse {
    pub deleted: u64,
    pub message: String,
}

/// Delete history older than the retention window
#[utoipa::path(
    post,
    path = "/api/notifications/history/clear",
    tag = "Notifications",
    request_body = ClearHistoryRequest,
    responses((status = 200, body = ClearHistoryResponse))
)]
async fn clear_history(
    State(state): State<AppState>,
    _auth: Authorized<NotificationsManage>,
    ValidatedJson(request): ValidatedJson<ClearHistoryRequest>,
) -> Result<Json<ClearHistoryResponse>> {
    let days = request.days.unwrap_or(90); // Default to 90 days retention
    let deleted = state.history.purge_older_than(days).await?;

    Ok(Json(ClearHistoryResponse {
        deleted,
        message: format!(
            "Deleted {} notification records older than {} days",
            deleted, days
        ),
    }))
}

// ============================================================================
// Inbox
// ============================================================================

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReceivedQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

/// Notifications the caller has received
#[utoipa::path(
    get,
    path = "/api/notifications/received",
    tag = "Notifications",
    params(ReceivedQuery),
    responses((status = 200, body = Vec<NotificationRecordView>))
)]
async fn list_received(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ReceivedQuery>,
) -> Result<Json<Vec<NotificationRecordView>>> {
    let records = state
        .history
        .list_for_recipient(auth.user_id()?, query.limit, query.offset)
        .await?;
    Ok(Json(records))
}

// ============================================================================
// Preferences
// ============================================================================

async fn get_preferences(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<NotificationPreferences>> {
    let preferences = state.preferences.get(auth.user_id()?).await?;
    Ok(Json(preferences))
}

async fn update_preferences(
    State(state): State<AppState>,
    auth: Authenticated,
    ValidatedJson(patch): ValidatedJson<NotificationPreferences>,
) -> Result<Json<NotificationPreferences>> {
    let preferences = state.preferences.update(auth.user_id()?, patch).await?;
    Ok(Json(preferences))
}
