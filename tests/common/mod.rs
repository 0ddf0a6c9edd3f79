//! Test helpers and utilities for integration testing.
//!
//! Provides an in-memory database, fixtures for profiles, roles,
//! subscriptions and medications, a scripted push transport and token
//! helpers for driving the router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use clinic_portal::migrations::Migrator;
use clinic_portal::models::user_role::AppRole;
use clinic_portal::models::{medication, profile, push_subscription, user_role};
use clinic_portal::services::push::{DeliveryDefaults, Dispatcher, PushError, PushTransport};
use clinic_portal::services::security::{create_access_token, SERVICE_ROLE};
use clinic_portal::state::AppState;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Use simple in-memory SQLite - each connection gets its own database
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    // Run migrations using the Migrator
    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

// ============================================================================
// Fixtures
// ============================================================================

/// Create a profile with the given roles
pub async fn create_test_profile(
    db: &DatabaseConnection,
    email: &str,
    roles: &[AppRole],
) -> profile::Model {
    let now = chrono::Utc::now();

    let profile = profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(None),
        notification_preferences: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();

    for role in roles {
        user_role::ActiveModel {
            user_id: Set(profile.id),
            role: Set(role.as_str().to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    profile
}

/// Store raw notification preferences JSON on a profile
pub async fn set_preferences(db: &DatabaseConnection, profile: &profile::Model, json: &str) {
    let mut active: profile::ActiveModel = profile.clone().into();
    active.notification_preferences = Set(Some(json.to_string()));
    active.update(db).await.unwrap();
}

pub async fn create_test_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
    endpoint: &str,
) -> push_subscription::Model {
    let now = chrono::Utc::now();

    push_subscription::ActiveModel {
        user_id: Set(user_id),
        endpoint: Set(endpoint.to_string()),
        p256dh: Set("BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".to_string()),
        auth: Set("tBHItJI5svbpez7KI4CCXg".to_string()),
        user_agent: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_test_medication(
    db: &DatabaseConnection,
    user_id: Uuid,
    name: &str,
    dosage: Option<&str>,
    is_active: bool,
) -> medication::Model {
    let now = chrono::Utc::now();

    medication::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        dosage: Set(dosage.map(String::from)),
        frequency: Set(Some("daily".to_string())),
        instructions: Set(None),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

// ============================================================================
// Push transport
// ============================================================================

/// Transport whose answer per endpoint is fixed up front.
///
/// Endpoints without a script are accepted with 201. Every call is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    statuses: HashMap<String, u16>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `status` for `endpoint`
    pub fn with_status(mut self, endpoint: &str, status: u16) -> Self {
        self.statuses.insert(endpoint.to_string(), status);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Decoded payloads in delivery order
    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn deliver(
        &self,
        subscription: &push_subscription::Model,
        payload: &[u8],
    ) -> Result<u16, PushError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .unwrap()
            .push(serde_json::from_slice(payload).unwrap());

        match self.statuses.get(&subscription.endpoint).copied() {
            Some(status) if (200..300).contains(&status) => Ok(status),
            Some(status) => Err(PushError::Rejected {
                status,
                reason: "scripted rejection".to_string(),
            }),
            None => Ok(201),
        }
    }
}

pub fn build_dispatcher(db: &DatabaseConnection, transport: Arc<ScriptedTransport>) -> Arc<Dispatcher> {
    let transport: Arc<dyn PushTransport> = transport;
    Arc::new(Dispatcher::new(
        db.clone(),
        transport,
        DeliveryDefaults::default(),
    ))
}

/// App state with push enabled over the given transport
pub fn build_app_state(db: DatabaseConnection, transport: Arc<ScriptedTransport>) -> AppState {
    let dispatcher = build_dispatcher(&db, transport);
    AppState::new(db, Some(dispatcher), Some("BTestPublicKey".to_string()))
}

/// App state with push not configured
pub fn build_app_state_without_push(db: DatabaseConnection) -> AppState {
    AppState::new(db, None, None)
}

// ============================================================================
// HTTP helpers
// ============================================================================

pub fn user_token(profile: &profile::Model) -> String {
    create_access_token(Some(&profile.id.to_string()), None, None).unwrap()
}

pub fn service_token() -> String {
    create_access_token(None, Some(SERVICE_ROLE), None).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
