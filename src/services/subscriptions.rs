use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::push_subscription;

/// Browser-generated key material for a subscription
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct SubscriptionKeys {
    #[validate(length(min = 1, message = "p256dh key is required"))]
    pub p256dh: String,
    #[validate(length(min = 1, message = "auth secret is required"))]
    pub auth: String,
}

/// Persistent store of users' push subscriptions.
///
/// A subscription is identified by `(user_id, endpoint)`; registering the
/// same endpoint twice refreshes its keys instead of adding a row.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    db: DbConn,
}

impl SubscriptionRegistry {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Create or refresh the subscription for `(user_id, endpoint)`
    pub async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        keys: &SubscriptionKeys,
        user_agent: Option<String>,
    ) -> Result<push_subscription::Model> {
        if endpoint.trim().is_empty() {
            return Err(AppError::BadRequest("Endpoint is required".to_string()));
        }

        let now = Utc::now();
        let subscription = push_subscription::ActiveModel {
            user_id: Set(user_id),
            endpoint: Set(endpoint.to_string()),
            p256dh: Set(keys.p256dh.clone()),
            auth: Set(keys.auth.clone()),
            user_agent: Set(user_agent),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        PushSubscription::insert(subscription)
            .on_conflict(
                OnConflict::columns([
                    push_subscription::Column::UserId,
                    push_subscription::Column::Endpoint,
                ])
                .update_columns([
                    push_subscription::Column::P256dh,
                    push_subscription::Column::Auth,
                    push_subscription::Column::UserAgent,
                    push_subscription::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find(user_id, endpoint)
            .await?
            .ok_or_else(|| AppError::Internal("Subscription vanished after upsert".to_string()))
    }

    pub async fn find(
        &self,
        user_id: Uuid,
        endpoint: &str,
    ) -> Result<Option<push_subscription::Model>> {
        let subscription = PushSubscription::find()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .filter(push_subscription::Column::Endpoint.eq(endpoint))
            .one(&self.db)
            .await?;

        Ok(subscription)
    }

    /// Remove a subscription. Removing one that does not exist is not an error;
    /// the return value tells whether a row was deleted.
    pub async fn remove(&self, user_id: Uuid, endpoint: &str) -> Result<bool> {
        let result = PushSubscription::delete_many()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .filter(push_subscription::Column::Endpoint.eq(endpoint))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// All subscriptions of a user, oldest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<push_subscription::Model>> {
        let subscriptions = PushSubscription::find()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .order_by_asc(push_subscription::Column::Id)
            .all(&self.db)
            .await?;

        Ok(subscriptions)
    }

    pub async fn count(&self, user_id: Uuid) -> Result<u64> {
        let count = PushSubscription::find()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_db, create_test_profile};

    fn keys(p256dh: &str, auth: &str) -> SubscriptionKeys {
        SubscriptionKeys {
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_refreshes_existing_endpoint() {
        let db = create_test_db().await;
        let user = create_test_profile(&db, "patient@example.com").await;
        let registry = SubscriptionRegistry::new(db);

        let first = registry
            .upsert(user.id, "https://push.example/a", &keys("k1", "a1"), None)
            .await
            .unwrap();
        let second = registry
            .upsert(
                user.id,
                "https://push.example/a",
                &keys("k2", "a2"),
                Some("Firefox".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.p256dh, "k2");
        assert_eq!(second.auth, "a2");
        assert_eq!(registry.count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_endpoint_for_two_users_is_two_rows() {
        let db = create_test_db().await;
        let alice = create_test_profile(&db, "alice@example.com").await;
        let bob = create_test_profile(&db, "bob@example.com").await;
        let registry = SubscriptionRegistry::new(db);

        registry
            .upsert(alice.id, "https://push.example/shared", &keys("k", "a"), None)
            .await
            .unwrap();
        registry
            .upsert(bob.id, "https://push.example/shared", &keys("k", "a"), None)
            .await
            .unwrap();

        assert_eq!(registry.count(alice.id).await.unwrap(), 1);
        assert_eq!(registry.count(bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_subscription_is_ok() {
        let db = create_test_db().await;
        let user = create_test_profile(&db, "patient@example.com").await;
        let registry = SubscriptionRegistry::new(db);

        assert!(!registry.remove(user.id, "https://push.example/none").await.unwrap());

        registry
            .upsert(user.id, "https://push.example/a", &keys("k", "a"), None)
            .await
            .unwrap();
        assert!(registry.remove(user.id, "https://push.example/a").await.unwrap());
        assert!(registry.list(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_endpoint_rejected() {
        let db = create_test_db().await;
        let user = create_test_profile(&db, "patient@example.com").await;
        let registry = SubscriptionRegistry::new(db);

        let err = registry
            .upsert(user.id, "  ", &keys("k", "a"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
