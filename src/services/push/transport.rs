use async_trait::async_trait;
use thiserror::Error;

use crate::models::push_subscription;

/// Why a single delivery did not go through
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push service rejected the message with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

impl PushError {
    /// HTTP status returned by the push service, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            PushError::Rejected { status, .. } => Some(*status),
            PushError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The push service says this subscription no longer exists
    pub fn is_expired(&self) -> bool {
        matches!(self.status(), Some(404) | Some(410))
    }
}

/// Sends one encrypted message to one subscription
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Returns the push service's success status code
    async fn deliver(
        &self,
        subscription: &push_subscription::Model,
        payload: &[u8],
    ) -> Result<u16, PushError>;
}
