use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{medication, profile};
use crate::services::preferences::NotificationPreferences;
use crate::services::push::{Dispatcher, PushRequest};
use crate::services::security::Caller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    /// At least one device accepted the reminder
    Sent,
    Failed,
    /// The patient turned medication reminders off
    SkippedOptedOut,
    /// The patient has no push subscriptions
    SkippedNoSubscriptions,
}

impl ReminderStatus {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            ReminderStatus::SkippedOptedOut | ReminderStatus::SkippedNoSubscriptions
        )
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReminderOutcome {
    pub medication_id: i64,
    pub user_id: Uuid,
    pub status: ReminderStatus,
    pub delivered: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct SweepReport {
    /// Active medications examined
    pub processed: usize,
    /// Reminders handed to the dispatcher
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub results: Vec<ReminderOutcome>,
}

impl SweepReport {
    fn push(&mut self, outcome: ReminderOutcome) {
        self.processed += 1;
        match outcome.status {
            ReminderStatus::SkippedOptedOut => self.skipped += 1,
            ReminderStatus::SkippedNoSubscriptions => {
                self.attempted += 1;
                self.skipped += 1;
            }
            ReminderStatus::Sent => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            ReminderStatus::Failed => self.attempted += 1,
        }
        self.results.push(outcome);
    }
}

/// Title, body and deep link for a medication's reminder
pub fn reminder_request(medication: &medication::Model) -> PushRequest {
    let body = match medication.dosage.as_deref().map(str::trim) {
        Some(dosage) if !dosage.is_empty() => {
            format!("Time to take {} ({})", medication.name, dosage)
        }
        _ => format!("Time to take {}", medication.name),
    };

    PushRequest::new(medication.user_id, "Medication reminder", body).with_data(json!({
        "type": "medication_reminder",
        "medicationId": medication.id,
        "url": "/patient/medications",
    }))
}

/// One pass over every active medication, reminding its patient.
///
/// Sweeps are stateless: running twice sends twice.
pub struct ReminderSweep {
    db: DbConn,
    dispatcher: Arc<Dispatcher>,
}

impl ReminderSweep {
    pub fn new(db: DbConn, dispatcher: Arc<Dispatcher>) -> Self {
        Self { db, dispatcher }
    }

    pub async fn run(&self) -> Result<SweepReport> {
        let targets = Medication::find()
            .filter(medication::Column::IsActive.eq(true))
            .order_by_asc(medication::Column::Id)
            .find_also_related(Profile)
            .all(&self.db)
            .await?;

        let mut report = SweepReport::default();
        for (medication, profile) in targets {
            let outcome = self.remind(&medication, profile.as_ref()).await;
            report.push(outcome);
        }

        tracing::info!(
            processed = report.processed,
            attempted = report.attempted,
            succeeded = report.succeeded,
            skipped = report.skipped,
            "Medication reminder sweep finished"
        );

        Ok(report)
    }

    async fn remind(
        &self,
        medication: &medication::Model,
        profile: Option<&profile::Model>,
    ) -> ReminderOutcome {
        let mut outcome = ReminderOutcome {
            medication_id: medication.id,
            user_id: medication.user_id,
            status: ReminderStatus::Failed,
            delivered: 0,
            failed: 0,
            error: None,
        };

        let preferences = NotificationPreferences::parse(
            profile.and_then(|p| p.notification_preferences.as_deref()),
        );
        if !preferences.allows_medication_reminders() {
            tracing::debug!(medication_id = medication.id, "Patient opted out of medication reminders");
            outcome.status = ReminderStatus::SkippedOptedOut;
            return outcome;
        }

        match self
            .dispatcher
            .send(&Caller::Service, reminder_request(medication))
            .await
        {
            Ok(report) => {
                outcome.delivered = report.delivered;
                outcome.failed = report.failed;
                if report.delivered > 0 {
                    outcome.status = ReminderStatus::Sent;
                } else {
                    outcome.error = Some("No device accepted the reminder".to_string());
                }
            }
            Err(AppError::NotOptedIn(_)) => {
                tracing::debug!(
                    medication_id = medication.id,
                    user_id = %medication.user_id,
                    "Patient has no push subscriptions"
                );
                outcome.status = ReminderStatus::SkippedNoSubscriptions;
            }
            Err(e) => {
                tracing::error!(
                    medication_id = medication.id,
                    error = %e,
                    "Failed to send medication reminder"
                );
                outcome.error = Some(e.to_string());
            }
        }

        outcome
    }
}
