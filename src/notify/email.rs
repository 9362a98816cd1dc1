//! Transactional email delivery
//!
//! Thin client over the email provider's send endpoint. When no API key
//! is configured (local dev), sends become logged no-ops instead of
//! failing the calling request.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::WilbeError;

#[derive(Serialize)]
struct SendPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// Client for the transactional email API
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl EmailClient {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Result<Self, WilbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WilbeError::Notify(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }

    /// Whether deliveries will actually leave the process
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one HTML email
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), WilbeError> {
        let Some(api_key) = &self.api_key else {
            debug!(to = %to, subject = %subject, "Email delivery disabled, skipping send");
            return Ok(());
        };

        let payload = SendPayload {
            from: &self.from,
            to: vec![to],
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WilbeError::Notify(format!("Email send failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WilbeError::Notify(format!(
                "Email provider returned {}: {}",
                status, body
            )));
        }

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
