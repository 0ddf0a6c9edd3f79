use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::endpoints::extractors::ValidatedJson;
use crate::error::Result;
use crate::middleware::permissions::{Authorized, NotificationsSend};
use crate::services::push::{DeliveryResult, PushRequest};
use crate::state::AppState;

/// Create push dispatch routes
pub fn push_routes(state: AppState) -> Router {
    Router::new()
        .route("/send-push-notification", post(send_push_notification))
        .with_state(state)
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPushRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "body is required"))]
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SendPushResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<DeliveryResult>,
}

/// Send a push notification to every device of one user (admins and the
/// service identity only)
#[utoipa::path(
    post,
    path = "/api/send-push-notification",
    tag = "Push",
    request_body = SendPushRequest,
    responses(
        (status = 200, body = SendPushResponse),
        (status = 400, description = "Invalid body or recipient has no subscriptions"),
        (status = 403, description = "Caller is not an admin"),
        (status = 503, description = "Push is not configured")
    )
)]
async fn send_push_notification(
    State(state): State<AppState>,
    auth: Authorized<NotificationsSend>,
    ValidatedJson(request): ValidatedJson<SendPushRequest>,
) -> Result<Json<SendPushResponse>> {
    let dispatcher = state.get_dispatcher()?;

    let report = dispatcher
        .send(
            auth.caller(),
            PushRequest {
                recipient_id: request.user_id,
                title: request.title,
                body: request.body,
                icon: request.icon,
                badge: request.badge,
                data: request.data,
            },
        )
        .await?;

    Ok(Json(SendPushResponse {
        success: true,
        message: format!(
            "Push notification sent to {} of {} devices",
            report.delivered,
            report.total()
        ),
        results: report.results,
    }))
}
