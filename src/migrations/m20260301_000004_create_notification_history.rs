//! Migration: Create notification_history table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_profiles::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationHistory::SenderId).uuid().null())
                    .col(
                        ColumnDef::new(NotificationHistory::RecipientId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationHistory::Title).string().not_null())
                    .col(ColumnDef::new(NotificationHistory::Body).text().not_null())
                    .col(ColumnDef::new(NotificationHistory::Icon).string().null())
                    .col(ColumnDef::new(NotificationHistory::Badge).string().null())
                    .col(ColumnDef::new(NotificationHistory::Data).text().null())
                    .col(
                        ColumnDef::new(NotificationHistory::Status)
                            .string()
                            .not_null()
                            .default("sent"),
                    )
                    .col(
                        ColumnDef::new(NotificationHistory::DeliveredCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NotificationHistory::FailedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NotificationHistory::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(NotificationHistory::Table, NotificationHistory::SenderId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(NotificationHistory::Table, NotificationHistory::RecipientId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_history_recipient")
                    .table(NotificationHistory::Table)
                    .col(NotificationHistory::RecipientId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_history_sent_at")
                    .table(NotificationHistory::Table)
                    .col(NotificationHistory::SentAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(NotificationHistory::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "notification_history"]
enum NotificationHistory {
    Table,
    Id,
    #[iden = "sender_id"]
    SenderId,
    #[iden = "recipient_id"]
    RecipientId,
    Title,
    Body,
    Icon,
    Badge,
    Data,
    Status,
    #[iden = "delivered_count"]
    DeliveredCount,
    #[iden = "failed_count"]
    FailedCount,
    #[iden = "sent_at"]
    SentAt,
}
