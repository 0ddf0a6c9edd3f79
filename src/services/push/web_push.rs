use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use web_push::{
    ContentEncoding, PartialVapidSignatureBuilder, SubscriptionInfo, VapidSignatureBuilder,
    WebPushMessage, WebPushMessageBuilder,
};

use super::transport::{PushError, PushTransport};
use crate::config::VapidConfig;
use crate::models::push_subscription;

/// Delivers messages over HTTP to the browser vendors' push services
pub struct WebPushTransport {
    signer: PartialVapidSignatureBuilder,
    subject: String,
    ttl: u32,
    client: reqwest::Client,
}

impl WebPushTransport {
    pub fn new(vapid: &VapidConfig, ttl: u32, timeout: Duration) -> Result<Self, PushError> {
        let signer = VapidSignatureBuilder::from_base64_no_sub(
            vapid.private_key.trim_end_matches('='),
            web_push::URL_SAFE_NO_PAD,
        )
        .map_err(|e| PushError::Encryption(format!("Invalid VAPID private key: {}", e)))?;

        let derived = URL_SAFE_NO_PAD.encode(signer.get_public_key());
        if derived != vapid.public_key.trim_end_matches('=') {
            tracing::warn!(
                "Configured VAPID public key does not match the private key; browsers will reject pushes"
            );
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            signer,
            subject: vapid.subject.clone(),
            ttl,
            client,
        })
    }

    fn build_message(
        &self,
        subscription: &push_subscription::Model,
        payload: &[u8],
    ) -> Result<WebPushMessage, PushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );

        let mut signature = self.signer.clone().add_sub_info(&info);
        signature.add_claim("sub", self.subject.as_str());
        let signature = signature
            .build()
            .map_err(|e| PushError::Encryption(format!("VAPID signing failed: {}", e)))?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(self.ttl);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);

        builder
            .build()
            .map_err(|e| PushError::InvalidSubscription(e.to_string()))
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn deliver(
        &self,
        subscription: &push_subscription::Model,
        payload: &[u8],
    ) -> Result<u16, PushError> {
        let message = self.build_message(subscription, payload)?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(body) = message.payload {
            request = request
                .header(CONTENT_ENCODING, "aes128gcm")
                .header(CONTENT_TYPE, "application/octet-stream");
            for (name, value) in body.crypto_headers {
                request = request.header(name, value);
            }
            request = request.body(body.content);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(status.as_u16())
        } else {
            let reason = response.text().await.unwrap_or_default();
            Err(PushError::Rejected {
                status: status.as_u16(),
                reason,
            })
        }
    }
}
