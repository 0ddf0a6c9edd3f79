use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::permissions::{Authorized, RemindersRun};
use crate::services::reminders::ReminderOutcome;
use crate::state::AppState;

/// Create reminder routes
pub fn reminders_routes(state: AppState) -> Router {
    Router::new()
        .route("/send-medication-reminders", post(send_medication_reminders))
        .with_state(state)
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SweepResponse {
    pub success: bool,
    pub message: String,
    pub processed: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub results: Vec<ReminderOutcome>,
}

/// Run the medication reminder sweep now
#[utoipa::path(
    post,
    path = "/api/send-medication-reminders",
    tag = "Push",
    responses(
        (status = 200, body = SweepResponse),
        (status = 403, description = "Missing reminders.run permission"),
        (status = 503, description = "Push is not configured")
    )
)]
async fn send_medication_reminders(
    State(state): State<AppState>,
    _auth: Authorized<RemindersRun>,
) -> Result<Json<SweepResponse>> {
    let report = state.reminder_sweep()?.run().await?;

    Ok(Json(SweepResponse {
        success: true,
        message: format!(
            "Sent {} of {} medication reminders",
            report.succeeded, report.attempted
        ),
        processed: report.processed,
        attempted: report.attempted,
        succeeded: report.succeeded,
        skipped: report.skipped,
        results: report.results,
    }))
}
