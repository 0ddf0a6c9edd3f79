pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_profiles;
mod m20260301_000002_create_user_roles;
mod m20260301_000003_create_push_subscriptions;
mod m20260301_000004_create_notification_history;
mod m20260301_000005_create_medications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_profiles::Migration),
            Box::new(m20260301_000002_create_user_roles::Migration),
            Box::new(m20260301_000003_create_push_subscriptions::Migration),
            Box::new(m20260301_000004_create_notification_history::Migration),
            Box::new(m20260301_000005_create_medications::Migration),
        ]
    }
}
