//! Dispatcher integration tests
//!
//! Covers:
//! - authorization before any lookup
//! - not-opted-in recipients
//! - independent fan-out with mixed results
//! - pruning of expired subscriptions
//! - exactly one history record per call

use std::sync::Arc;

use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

mod common;
use common::{
    build_dispatcher, create_test_db, create_test_profile, create_test_subscription,
    ScriptedTransport,
};

use clinic_portal::error::AppError;
use clinic_portal::models::prelude::*;
use clinic_portal::models::user_role::AppRole;
use clinic_portal::services::push::PushRequest;
use clinic_portal::services::security::Caller;
use clinic_portal::services::subscriptions::SubscriptionRegistry;

#[tokio::test]
async fn test_admin_reaches_all_devices() {
    let db = create_test_db().await;
    let admin = create_test_profile(&db, "admin@clinic.test", &[AppRole::Admin]).await;
    let patient = create_test_profile(&db, "v@clinic.test", &[AppRole::Patient]).await;
    create_test_subscription(&db, patient.id, "https://push.test/1").await;
    create_test_subscription(&db, patient.id, "https://push.test/2").await;

    let transport = Arc::new(ScriptedTransport::new());
    let dispatcher = build_dispatcher(&db, transport.clone());

    let report = dispatcher
        .send(
            &Caller::user(admin.id, vec![AppRole::Admin]),
            PushRequest::new(patient.id, "Lab results", "Your results are ready"),
        )
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(transport.calls(), 2);
    assert!(report.record_id.is_some());

    let payload = &transport.payloads()[0];
    assert_eq!(payload["title"], "Lab results");
    assert_eq!(payload["icon"], "/icon-192.png");
    assert_eq!(payload["badge"], "/badge-72.png");
    assert_eq!(payload["data"], serde_json::json!({}));

    let record = NotificationRecord::find_by_id(report.record_id.unwrap())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.sender_id, Some(admin.id));
    assert_eq!(record.recipient_id, patient.id);
    assert_eq!(record.status, "sent");
    assert_eq!(record.delivered_count, 2);
}

#[tokio::test]
async fn test_non_admin_forbidden_without_sending() {
    let db = create_test_db().await;
    let doctor = create_test_profile(&db, "doc@clinic.test", &[AppRole::Doctor]).await;
    let patient = create_test_profile(&db, "v@clinic.test", &[AppRole::Patient]).await;
    create_test_subscription(&db, patient.id, "https://push.test/1").await;

    let transport = Arc::new(ScriptedTransport::new());
    let dispatcher = build_dispatcher(&db, transport.clone());

    let err = dispatcher
        .send(
            &Caller::user(doctor.id, vec![AppRole::Doctor]),
            PushRequest::new(patient.id, "Hi", "There"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(transport.calls(), 0);
    assert_eq!(NotificationRecord::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_recipient_without_subscriptions_is_not_opted_in() {
    let db = create_test_db().await;
    let patient = create_test_profile(&db, "u@clinic.test", &[AppRole::Patient]).await;

    let transport = Arc::new(ScriptedTransport::new());
    let dispatcher = build_dispatcher(&db, transport.clone());

    let err = dispatcher
        .send(&Caller::Service, PushRequest::new(patient.id, "Hi", "There"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotOptedIn(_)));
    assert_eq!(transport.calls(), 0);
    assert_eq!(NotificationRecord::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_one_failure_does_not_cancel_siblings() {
    let db = create_test_db().await;
    let patient = create_test_profile(&db, "v@clinic.test", &[AppRole::Patient]).await;
    create_test_subscription(&db, patient.id, "https://push.test/ok-1").await;
    create_test_subscription(&db, patient.id, "https://push.test/broken").await;
    create_test_subscription(&db, patient.id, "https://push.test/ok-2").await;

    let transport = Arc::new(
        ScriptedTransport::new().with_status("https://push.test/broken", 500),
    );
    let dispatcher = build_dispatcher(&db, transport.clone());

    let report = dispatcher
        .send(&Caller::Service, PushRequest::new(patient.id, "Hi", "There"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.pruned, 0);

    let broken = report
        .results
        .iter()
        .find(|r| r.endpoint == "https://push.test/broken")
        .unwrap();
    assert!(!broken.success);
    assert_eq!(broken.status, Some(500));

    // Exactly one record, sender is the service (no profile)
    let records = NotificationRecord::find().all(&db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "partial");
    assert_eq!(records[0].sender_id, None);
}

#[tokio::test]
async fn test_expired_subscriptions_are_pruned() {
    let db = create_test_db().await;
    let patient = create_test_profile(&db, "v@clinic.test", &[AppRole::Patient]).await;
    create_test_subscription(&db, patient.id, "https://push.test/gone").await;
    create_test_subscription(&db, patient.id, "https://push.test/missing").await;
    create_test_subscription(&db, patient.id, "https://push.test/flaky").await;

    let transport = Arc::new(
        ScriptedTransport::new()
            .with_status("https://push.test/gone", 410)
            .with_status("https://push.test/missing", 404)
            .with_status("https://push.test/flaky", 503),
    );
    let dispatcher = build_dispatcher(&db, transport);

    let report = dispatcher
        .send(&Caller::Service, PushRequest::new(patient.id, "Hi", "There"))
        .await
        .unwrap();

    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 3);
    assert_eq!(report.pruned, 2);

    let remaining = SubscriptionRegistry::new(db.clone())
        .list(patient.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].endpoint, "https://push.test/flaky");

    let records = NotificationRecord::find().all(&db).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "failed");
    assert_eq!(records[0].failed_count, 3);
}

#[tokio::test]
async fn test_only_recipient_devices_are_used() {
    let db = create_test_db().await;
    let u = create_test_profile(&db, "u@clinic.test", &[AppRole::Patient]).await;
    let v = create_test_profile(&db, "v@clinic.test", &[AppRole::Patient]).await;
    create_test_subscription(&db, u.id, "https://push.test/u").await;
    create_test_subscription(&db, v.id, "https://push.test/v").await;

    let transport = Arc::new(ScriptedTransport::new());
    let dispatcher = build_dispatcher(&db, transport.clone());

    let report = dispatcher
        .send(&Caller::Service, PushRequest::new(v.id, "Hi", "There"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(report.results[0].endpoint, "https://push.test/v");
}

#[tokio::test]
async fn test_unknown_recipient_is_not_opted_in() {
    let db = create_test_db().await;
    let dispatcher = build_dispatcher(&db, Arc::new(ScriptedTransport::new()));

    let err = dispatcher
        .send(&Caller::Service, PushRequest::new(Uuid::new_v4(), "Hi", "There"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotOptedIn(_)));
}
