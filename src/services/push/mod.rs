//! Web Push delivery
//!
//! The [`Dispatcher`] fans a notification out to every subscription of one
//! recipient through a [`PushTransport`]. [`WebPushTransport`] is the real
//! transport (VAPID-signed, aes128gcm-encrypted requests to the browser's
//! push service); tests substitute scripted transports.

mod dispatcher;
mod transport;
mod web_push;

pub use dispatcher::Dispatcher;
pub use transport::{PushError, PushTransport};
pub use web_push::WebPushTransport;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PushConfig;

/// Icon and badge used when a request omits them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDefaults {
    pub icon: String,
    pub badge: String,
}

impl Default for DeliveryDefaults {
    fn default() -> Self {
        Self {
            icon: "/icon-192.png".to_string(),
            badge: "/badge-72.png".to_string(),
        }
    }
}

impl DeliveryDefaults {
    pub fn from_config(config: &PushConfig) -> Self {
        Self {
            icon: config.default_icon.clone(),
            badge: config.default_badge.clone(),
        }
    }
}

/// A notification addressed to one recipient
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl PushRequest {
    pub fn new(recipient_id: Uuid, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient_id,
            title: title.into(),
            body: body.into(),
            icon: None,
            badge: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// JSON document encrypted into each push message; the service worker reads
/// these exact keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: serde_json::Value,
}

impl PushPayload {
    pub fn from_request(request: &PushRequest, defaults: &DeliveryDefaults) -> Self {
        Self {
            title: request.title.clone(),
            body: request.body.clone(),
            icon: request
                .icon
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults.icon.clone()),
            badge: request
                .badge
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults.badge.clone()),
            data: request
                .data
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        }
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DeliveryResult {
    pub endpoint: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(endpoint: &str, status: u16) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: true,
            status: Some(status),
            error: None,
        }
    }

    pub fn failed(endpoint: &str, error: &PushError) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: false,
            status: error.status(),
            error: Some(error.to_string()),
        }
    }
}

/// Everything a dispatch produced
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// One entry per subscription, in subscription order
    pub results: Vec<DeliveryResult>,
    pub delivered: usize,
    pub failed: usize,
    /// Subscriptions removed because the push service reported them gone
    pub pruned: usize,
    /// History row id, `None` if recording failed
    pub record_id: Option<i64>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }
}
