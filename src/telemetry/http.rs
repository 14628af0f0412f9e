use super::{TelemetryMessage, Transport};
use crate::error::PublishError;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use sha2::Sha256;
use tracing::debug;

/// Posts each message body to a telemetry sink.
///
/// Headers: `x-output-name` carries the output channel, `x-message-id` the
/// sequence id and, with an HMAC key, `x-signature` the hex HMAC-SHA256 of
/// the body.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    hmac_key: Option<String>,
}

impl HttpTransport {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            hmac_key: None,
        }
    }

    pub fn with_hmac(mut self, hmac_key: String) -> Self {
        self.hmac_key = Some(hmac_key);
        self
    }

    fn create_signature(&self, data: &[u8]) -> Result<Option<String>, PublishError> {
        let Some(hmac_key) = &self.hmac_key else {
            return Ok(None);
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key.as_bytes())
            .map_err(|e| PublishError::Signature(e.to_string()))?;
        mac.update(data);
        Ok(Some(hex::encode(mac.finalize().into_bytes())))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, message: &TelemetryMessage) -> Result<(), PublishError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header("x-output-name", message.output.as_str())
            .header("x-message-id", message.id.to_string());

        if let Some(signature) = self.create_signature(&message.body)? {
            debug!("Generated signature: {}", signature);
            request = request.header("x-signature", signature);
        }

        debug!("Sending message {} to: {}", message.id, self.url);
        let response = request.body(message.body.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
