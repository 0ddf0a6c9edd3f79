use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of one dispatch call
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `None` when sent by the scheduled sweep
    pub sender_id: Option<Uuid>,
    pub recipient_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub data: Option<String>, // JSON string for flexible data
    pub status: String,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub sent_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Overall delivery status of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Partial,
    Failed,
}

impl DeliveryStatus {
    pub fn from_counts(delivered: usize, failed: usize) -> Self {
        match (delivered, failed) {
            (_, 0) => DeliveryStatus::Sent,
            (0, _) => DeliveryStatus::Failed,
            _ => DeliveryStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Partial => "partial",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
