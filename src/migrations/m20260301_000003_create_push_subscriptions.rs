//! Migration: Create push_subscriptions table

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
                    .table(PushSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PushSubscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PushSubscriptions::UserId).uuid().not_null())
                    .col(ColumnDef::new(PushSubscriptions::Endpoint).text().not_null())
                    .col(ColumnDef::new(PushSubscriptions::P256dh).string().not_null())
                    .col(ColumnDef::new(PushSubscriptions::Auth).string().not_null())
                    .col(ColumnDef::new(PushSubscriptions::UserAgent).string().null())
                    .col(
                        ColumnDef::new(PushSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PushSubscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PushSubscriptions::Table, PushSubscriptions::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Upserts conflict on this pair
        manager
            .create_index(
                Index::create()
                    .name("idx_push_subscriptions_user_endpoint")
                    .table(PushSubscriptions::Table)
                    .col(PushSubscriptions::UserId)
                    .col(PushSubscriptions::Endpoint)
                    .unique()
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
                    .table(PushSubscriptions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "push_subscriptions"]
enum PushSubscriptions {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    Endpoint,
    #[iden = "p256dh"]
    P256dh,
    Auth,
    #[iden = "user_agent"]
    UserAgent,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
