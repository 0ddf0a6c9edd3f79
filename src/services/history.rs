use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::notification_record::{self, DeliveryStatus};
use crate::models::prelude::*;
use crate::services::push::PushPayload;

/// Everything needed to write one history row
#[derive(Debug, Clone)]
pub struct NewNotificationRecord<'a> {
    /// `None` for the scheduled sweep
    pub sender_id: Option<Uuid>,
    pub recipient_id: Uuid,
    pub payload: &'a PushPayload,
    pub delivered: usize,
    pub failed: usize,
}

/// Query parameters for fetching notification history
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub recipient_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// A history row with its data decoded
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationRecordView {
    pub id: i64,
    pub sender_id: Option<Uuid>,
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub data: Option<serde_json::Value>,
    pub status: String,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub sent_at: DateTime<Utc>,
}

impl From<notification_record::Model> for NotificationRecordView {
    fn from(record: notification_record::Model) -> Self {
        Self {
            data: record
                .data
                .as_deref()
                .and_then(|d| serde_json::from_str(d).ok()),
            id: record.id,
            sender_id: record.sender_id,
            recipient_id: record.recipient_id,
            title: record.title,
            body: record.body,
            icon: record.icon,
            badge: record.badge,
            status: record.status,
            delivered_count: record.delivered_count,
            failed_count: record.failed_count,
            sent_at: record.sent_at,
        }
    }
}

/// Paginated history response
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HistoryResponse {
    pub records: Vec<NotificationRecordView>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Append-only log of dispatches
#[derive(Clone)]
pub struct NotificationHistory {
    db: DbConn,
}

impl NotificationHistory {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Write one history row for a finished dispatch
    pub async fn record(
        &self,
        entry: NewNotificationRecord<'_>,
    ) -> Result<notification_record::Model> {
        let payload = entry.payload;
        let data = match &payload.data {
            serde_json::Value::Null => None,
            value => Some(value.to_string()),
        };

        let record = notification_record::ActiveModel {
            sender_id: Set(entry.sender_id),
            recipient_id: Set(entry.recipient_id),
            title: Set(payload.title.clone()),
            body: Set(payload.body.clone()),
            icon: Set(Some(payload.icon.clone())),
            badge: Set(Some(payload.badge.clone())),
            data: Set(data),
            status: Set(DeliveryStatus::from_counts(entry.delivered, entry.failed).to_string()),
            delivered_count: Set(entry.delivered as i32),
            failed_count: Set(entry.failed as i32),
            sent_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(record.insert(&self.db).await?)
    }

    /// Filtered, paginated history, newest first
    pub async fn list(&self, query: HistoryQuery) -> Result<HistoryResponse> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut select = NotificationRecord::find();

        if let Some(recipient_id) = query.recipient_id {
            select = select.filter(notification_record::Column::RecipientId.eq(recipient_id));
        }

        if let Some(sender_id) = query.sender_id {
            select = select.filter(notification_record::Column::SenderId.eq(sender_id));
        }

        if let Some(status) = &query.status {
            let status = match status.as_str() {
                "sent" | "partial" | "failed" => status.clone(),
                other => {
                    return Err(AppError::BadRequest(format!(
                        "Unknown delivery status: {}",
                        other
                    )))
                }
            };
            select = select.filter(notification_record::Column::Status.eq(status));
        }

        if let Some(from) = query.from {
            select = select.filter(notification_record::Column::SentAt.gte(from));
        }

        if let Some(to) = query.to {
            select = select.filter(notification_record::Column::SentAt.lte(to));
        }

        let total = select.clone().count(&self.db).await?;

        let records = select
            .order_by_desc(notification_record::Column::SentAt)
            .order_by_desc(notification_record::Column::Id)
            .offset(offset)
            .limit(per_page)
            .all(&self.db)
            .await?;

        let total_pages = total.div_ceil(per_page);

        Ok(HistoryResponse {
            records: records.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Notifications a user has received, newest first
    pub async fn list_for_recipient(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<NotificationRecordView>> {
        let records = NotificationRecord::find()
            .filter(notification_record::Column::RecipientId.eq(user_id))
            .order_by_desc(notification_record::Column::SentAt)
            .order_by_desc(notification_record::Column::Id)
            .offset(offset)
            .limit(limit.clamp(1, 100))
            .all(&self.db)
            .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Retention policy: drop rows older than `days`
    pub async fn purge_older_than(&self, days: i64) -> Result<u64> {
        if days < 0 {
            return Err(AppError::BadRequest(
                "Retention days must not be negative".to_string(),
            ));
        }

        let cutoff = Utc::now() - chrono::Duration::days(days);

        let result = NotificationRecord::delete_many()
            .filter(notification_record::Column::SentAt.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
