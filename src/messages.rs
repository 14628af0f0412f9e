use crate::types::{FailureReason, Prediction};
use serde::{Deserialize, Serialize};

/// Body returned by the classification endpoint.
///
/// Only `predictions` is required; the remaining fields are reported by
/// Custom Vision style services and kept for logging.
#[derive(Deserialize, Debug)]
pub struct PredictionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub iteration: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    pub predictions: Vec<Prediction>,
}

/// Telemetry payload published when a cycle failed before any
/// classification response existed.
#[derive(Serialize, Debug)]
pub struct FailureMarker<'a> {
    pub status: &'a str,
    pub reason: &'a str,
}

impl<'a> FailureMarker<'a> {
    pub fn new(reason: &FailureReason) -> Self {
        Self {
            status: "failed",
            reason: reason.as_str(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"status":"{}","reason":"{}"}}"#, self.status, self.reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_vision_body() {
        let body = r#"{
            "id": "7c1e",
            "project": "p",
            "iteration": "i",
            "created": "2019-06-01T08:00:00Z",
            "predictions": [
                {"probability": 0.8, "tagId": "a", "tagName": "键盘", "boundingBox": null},
                {"probability": 0.1, "tagId": "b", "tagName": "鼠标"}
            ]
        }"#;
        let response: PredictionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.predictions.len(), 2);
        assert_eq!(response.predictions[0].tag_name, "键盘");
        assert_eq!(response.id.as_deref(), Some("7c1e"));
    }

    #[test]
    fn test_missing_predictions_is_error() {
        assert!(serde_json::from_str::<PredictionResponse>(r#"{"error":"bad image"}"#).is_err());
    }

    #[test]
    fn test_failure_marker_json() {
        let marker = FailureMarker::new(&FailureReason::Transport);
        assert_eq!(marker.to_json(), r#"{"status":"failed","reason":"transport"}"#);
    }
}
