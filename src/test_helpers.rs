//! Test helpers and utilities for unit testing.
//!
//! Provides an in-memory database with the full schema plus a few fixtures.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::migrations::Migrator;
use crate::models::{profile, push_subscription};
use crate::services::push::{PushError, PushTransport};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Insert a profile with a fresh id
pub async fn create_test_profile(db: &DatabaseConnection, email: &str) -> profile::Model {
    let now = chrono::Utc::now();

    profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(None),
        notification_preferences: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to create test profile")
}

/// Transport that accepts every message with 201 Created
pub struct AcceptAllTransport;

#[async_trait]
impl PushTransport for AcceptAllTransport {
    async fn deliver(
        &self,
        _subscription: &push_subscription::Model,
        _payload: &[u8],
    ) -> Result<u16, PushError> {
        Ok(201)
    }
}
