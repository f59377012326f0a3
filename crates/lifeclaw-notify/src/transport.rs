//! HTTP push transport.
//!
//! The destination payload stored in a subscription must carry an `endpoint`
//! URL; the message is POSTed there as JSON. HTTP 404/410 from the endpoint
//! means the destination is permanently gone and the subscription should be
//! purged; anything else is transient.

use async_trait::async_trait;

use lifeclaw_core::config::PushConfig;
use lifeclaw_core::error::PushError;
use lifeclaw_core::traits::PushTransport;
use lifeclaw_core::types::PushMessage;

pub struct HttpPushTransport {
    client: reqwest::Client,
    headers: Vec<(String, String)>,
    timeout: std::time::Duration,
}

impl HttpPushTransport {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            headers: config.headers.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(
        &self,
        destination: &serde_json::Value,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        let Some(endpoint) = destination["endpoint"].as_str() else {
            // A destination we cannot interpret is as good as gone.
            return Err(PushError::Gone);
        };

        let mut req = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({
                "title": message.title,
                "body": message.body,
                "data": message.data,
            }))
            .timeout(self.timeout);

        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(auth) = destination["auth"].as_str() {
            req = req.header("Authorization", auth);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PushError::Transient(format!("push send failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!("✅ Push delivered to {endpoint}: {}", message.title);
            Ok(())
        } else if status == reqwest::StatusCode::GONE || status == reqwest::StatusCode::NOT_FOUND {
            Err(PushError::Gone)
        } else {
            Err(PushError::Transient(format!("push endpoint error {status}")))
        }
    }
}
