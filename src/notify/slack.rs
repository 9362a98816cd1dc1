//! Slack incoming-webhook notifications
//!
//! Internal team pings for merch orders and waitlist milestones. Like
//! email, an unconfigured webhook turns posts into logged no-ops.

use std::time::Duration;
use tracing::{debug, info};

use crate::types::WilbeError;

/// Client for a Slack incoming webhook
#[derive(Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Result<Self, WilbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WilbeError::Notify(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    pub fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post a plain-text message to the team channel
    pub async fn post(&self, text: &str) -> Result<(), WilbeError> {
        let Some(url) = &self.webhook_url else {
            debug!("Slack webhook not configured, skipping post");
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| WilbeError::Notify(format!("Slack post failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WilbeError::Notify(format!(
                "Slack webhook returned {}: {}",
                status, body
            )));
        }

        info!("Slack notification posted");
        Ok(())
    }
}
