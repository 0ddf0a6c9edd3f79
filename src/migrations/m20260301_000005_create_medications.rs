//! Migration: Create medications table

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
                    .table(Medications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Medications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Medications::UserId).uuid().not_null())
                    .col(ColumnDef::new(Medications::Name).string().not_null())
                    .col(ColumnDef::new(Medications::Dosage).string().null())
                    .col(ColumnDef::new(Medications::Frequency).string().null())
                    .col(ColumnDef::new(Medications::Instructions).string().null())
                    .col(
                        ColumnDef::new(Medications::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Medications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Medications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Medications::Table, Medications::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_medications_active")
                    .table(Medications::Table)
                    .col(Medications::IsActive)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Medications::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Medications {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    Name,
    Dosage,
    Frequency,
    Instructions,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
