//! HTTP client for the remote image classifier.
//!
//! One call is one `POST` of the raw image bytes with
//! `Content-Type: application/octet-stream`. The answer is a JSON document
//! with a `predictions` array; the best-scoring entry is the result.

use crate::error::{ClassificationError, TransportError};
use crate::indicator::{IndicatorController, IndicatorState, OutputLines};
use crate::messages::PredictionResponse;
use crate::types::{ClassificationOutcome, FailureReason, Prediction};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ClassificationClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ClassificationClient {
    /// Client posting to `endpoint`, giving up on a request after `timeout`.
    ///
    /// Connections are not pooled: each exchange closes its socket once the
    /// response body has been read.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Classify the image stored at `image_path`.
    ///
    /// The indicator is switched to [`IndicatorState::Processing`] once the
    /// image has been read and stays there; the caller shows the final state.
    /// Only an unreadable image is an error. Transport failures and empty
    /// prediction lists come back as [`ClassificationOutcome::Failed`].
    pub async fn classify<L: OutputLines>(
        &self,
        image_path: &Path,
        indicator: &mut IndicatorController<L>,
    ) -> Result<ClassificationOutcome, ClassificationError> {
        let image = tokio::fs::read(image_path)
            .await
            .map_err(|source| ClassificationError::ImageRead {
                path: image_path.to_path_buf(),
                source,
            })?;
        debug!("Read {} bytes from {}", image.len(), image_path.display());

        indicator.set_state(IndicatorState::Processing);

        let body = match self.post_image(image).await {
            Ok(body) => body,
            Err(e) => {
                match e.status_code() {
                    Some(status) => error!(
                        "Classification request failed: {} (status {})",
                        e, status
                    ),
                    None => error!("Classification request failed: {}", e),
                }
                return Ok(ClassificationOutcome::failed(FailureReason::Transport));
            }
        };

        match interpret_response(body) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Unreadable classification response: {}", e);
                Ok(ClassificationOutcome::failed(FailureReason::Transport))
            }
        }
    }

    async fn post_image(&self, image: Vec<u8>) -> Result<String, TransportError> {
        debug!("Sending image to: {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        info!(
            "Response from classification service: ({}) {}",
            status.as_u16(),
            body
        );

        if !status.is_success() {
            return Err(TransportError::Status {
                status_code: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

fn interpret_response(body: String) -> Result<ClassificationOutcome, TransportError> {
    let response: PredictionResponse = serde_json::from_str(&body)?;
    let raw_json = body.trim().to_string();

    match best_prediction(&response.predictions) {
        Some(prediction) => {
            info!(
                "Object = {} ({:.3})",
                prediction.tag_name, prediction.probability
            );
            Ok(ClassificationOutcome::Success {
                prediction: prediction.clone(),
                raw_json,
            })
        }
        None => {
            info!("Classification service returned no predictions");
            Ok(ClassificationOutcome::Failed {
                reason: FailureReason::EmptyResult,
                raw_json: Some(raw_json),
            })
        }
    }
}

/// The prediction with the highest probability.
///
/// Scans left to right and only replaces the current best on a strictly
/// greater probability, so the first of several tied maxima wins.
pub fn best_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    let (first, rest) = predictions.split_first()?;
    let mut best = first;
    for prediction in rest {
        if prediction.probability > best.probability {
            best = prediction;
        }
    }
    Some(best)
}
