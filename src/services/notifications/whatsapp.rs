use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

/// Sends WhatsApp messages through an HTTP bridge exposing `POST /send-message`.
pub struct WhatsAppBridgeProvider {
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppBridgeProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppBridgeProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!("{}/send-message", self.base_url);

        let res = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "phone": to, "message": body }))
            .send()
            .await
            .context("failed to reach WhatsApp bridge")?
            .error_for_status()
            .context("WhatsApp bridge returned error")?;

        tracing::debug!(status = %res.status(), "WhatsApp message accepted");
        Ok(())
    }
}
