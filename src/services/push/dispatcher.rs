use std::sync::Arc;

use futures_util::future::join_all;

use super::transport::PushTransport;
use super::{DeliveryDefaults, DeliveryResult, DispatchReport, PushPayload, PushRequest};
use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::services::history::{NewNotificationRecord, NotificationHistory};
use crate::services::security::Caller;
use crate::services::subscriptions::SubscriptionRegistry;

/// Sends one notification to every device of a recipient
pub struct Dispatcher {
    subscriptions: SubscriptionRegistry,
    history: NotificationHistory,
    transport: Arc<dyn PushTransport>,
    defaults: DeliveryDefaults,
}

impl Dispatcher {
    pub fn new(db: DbConn, transport: Arc<dyn PushTransport>, defaults: DeliveryDefaults) -> Self {
        Self {
            subscriptions: SubscriptionRegistry::new(db.clone()),
            history: NotificationHistory::new(db),
            transport,
            defaults,
        }
    }

    /// Deliver `request` to all of the recipient's subscriptions concurrently.
    ///
    /// Only elevated callers may dispatch, and the check happens before any
    /// lookup. A recipient without subscriptions yields
    /// [`AppError::NotOptedIn`]. Per-endpoint failures never abort the
    /// batch; subscriptions the push service reports as gone are pruned
    /// afterwards and exactly one history row is written per call.
    pub async fn send(&self, caller: &Caller, request: PushRequest) -> Result<DispatchReport> {
        if !caller.is_elevated() {
            return Err(AppError::Forbidden(
                "Admin access required to send push notifications".to_string(),
            ));
        }

        let subscriptions = self.subscriptions.list(request.recipient_id).await?;
        if subscriptions.is_empty() {
            return Err(AppError::NotOptedIn(
                "User has not enabled push notifications".to_string(),
            ));
        }

        let payload = PushPayload::from_request(&request, &self.defaults);
        let body = serde_json::to_vec(&payload)?;
        let body = body.as_slice();
        let transport = &self.transport;

        let outcomes = join_all(subscriptions.iter().map(|subscription| async move {
            (subscription, transport.deliver(subscription, body).await)
        }))
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut expired = Vec::new();

        for (subscription, outcome) in outcomes {
            match outcome {
                Ok(status) => {
                    results.push(DeliveryResult::delivered(&subscription.endpoint, status));
                }
                Err(e) => {
                    tracing::warn!(
                        recipient = %request.recipient_id,
                        endpoint = %subscription.endpoint,
                        error = %e,
                        "Push delivery failed"
                    );
                    if e.is_expired() {
                        expired.push(subscription.endpoint.as_str());
                    }
                    results.push(DeliveryResult::failed(&subscription.endpoint, &e));
                }
            }
        }

        let mut pruned = 0;
        for endpoint in expired {
            match self.subscriptions.remove(request.recipient_id, endpoint).await {
                Ok(true) => pruned += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Failed to prune expired subscription");
                }
            }
        }

        let delivered = results.iter().filter(|r| r.success).count();
        let failed = results.len() - delivered;

        let record_id = match self
            .history
            .record(NewNotificationRecord {
                sender_id: caller.user_id(),
                recipient_id: request.recipient_id,
                payload: &payload,
                delivered,
                failed,
            })
            .await
        {
            Ok(record) => Some(record.id),
            Err(e) => {
                tracing::error!(error = %e, "Failed to record notification history");
                None
            }
        };

        tracing::info!(
            recipient = %request.recipient_id,
            delivered,
            failed,
            pruned,
            "Push notification dispatched"
        );

        Ok(DispatchReport {
            results,
            delivered,
            failed,
            pruned,
            record_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user_role::AppRole;
    use crate::test_helpers::{create_test_db, AcceptAllTransport};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_non_admin_rejected_before_lookup() {
        // No migrations: any query would fail with a database error
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let dispatcher = Dispatcher::new(db, Arc::new(AcceptAllTransport), DeliveryDefaults::default());
        let caller = Caller::user(Uuid::new_v4(), vec![AppRole::Doctor]);

        let err = dispatcher
            .send(&caller, PushRequest::new(Uuid::new_v4(), "T", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_recipient_without_subscriptions_not_opted_in() {
        let db = create_test_db().await;
        let dispatcher = Dispatcher::new(db, Arc::new(AcceptAllTransport), DeliveryDefaults::default());

        let err = dispatcher
            .send(&Caller::Service, PushRequest::new(Uuid::new_v4(), "T", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotOptedIn(_)));
    }
}
