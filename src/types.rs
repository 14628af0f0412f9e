//! Common types shared by the stages of a classification cycle.
//!
//! Everything here lives for a single cycle: it is created when a frame is
//! classified and dropped once the result has been published.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single label/confidence pair returned by the classification endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    /// Label of the detected object
    #[serde(rename = "tagName")]
    pub tag_name: String,
    /// Confidence score for the label (0.0 to 1.0)
    pub probability: f64,
    /// Identifier of the tag in the classifier project, when reported
    #[serde(rename = "tagId", default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
}

impl Prediction {
    pub fn new(tag_name: impl Into<String>, probability: f64) -> Self {
        Self {
            tag_name: tag_name.into(),
            probability,
            tag_id: None,
        }
    }
}

/// Waste category a detected object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// 可回收垃圾
    Recyclable,
    /// 有害垃圾
    Hazardous,
    /// 湿垃圾
    Household,
    /// 干垃圾
    Residual,
    /// The tag is in none of the category tables
    Unknown,
}

impl Category {
    /// Stable identifier used in logs and telemetry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recyclable => "recyclable",
            Category::Hazardous => "hazardous",
            Category::Household => "household",
            Category::Residual => "residual",
            Category::Unknown => "unknown",
        }
    }

    /// Name of the category as printed on the bins.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Recyclable => "可回收垃圾",
            Category::Hazardous => "有害垃圾",
            Category::Household => "湿垃圾",
            Category::Residual => "干垃圾",
            Category::Unknown => "未知",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a cycle produced no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No fresh frame could be captured
    Acquire,
    /// The captured frame could not be read from disk
    ImageRead,
    /// The classification request failed or returned an unparseable body
    Transport,
    /// The classifier answered with zero predictions
    EmptyResult,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Acquire => "acquire",
            FailureReason::ImageRead => "image-read",
            FailureReason::Transport => "transport",
            FailureReason::EmptyResult => "empty-result",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one exchange with the classification endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Success {
        /// Best-scoring prediction of the response
        prediction: Prediction,
        /// Response body exactly as received
        raw_json: String,
    },
    Failed {
        reason: FailureReason,
        /// Response body, when the endpoint produced a parseable one
        raw_json: Option<String>,
    },
}

impl ClassificationOutcome {
    pub fn failed(reason: FailureReason) -> Self {
        ClassificationOutcome::Failed {
            reason,
            raw_json: None,
        }
    }
}

/// Result of a full acquire/classify/map pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Classified {
        category: Category,
        prediction: Prediction,
        raw_json: String,
    },
    Failed {
        reason: FailureReason,
        raw_json: Option<String>,
    },
}

impl CycleOutcome {
    /// Category decided by the cycle, `None` when the pipeline failed.
    pub fn category(&self) -> Option<Category> {
        match self {
            CycleOutcome::Classified { category, .. } => Some(*category),
            CycleOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_wire_names() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"tagName":"瓶","probability":0.95,"tagId":"t-1"}"#).unwrap();
        assert_eq!(prediction.tag_name, "瓶");
        assert_eq!(prediction.probability, 0.95);
        assert_eq!(prediction.tag_id.as_deref(), Some("t-1"));

        let json = serde_json::to_string(&Prediction::new("电池", 0.5)).unwrap();
        assert_eq!(json, r#"{"tagName":"电池","probability":0.5}"#);
    }

    #[test]
    fn test_failure_reason_names() {
        assert_eq!(FailureReason::EmptyResult.to_string(), "empty-result");
        assert_eq!(FailureReason::Transport.as_str(), "transport");
        assert_eq!(FailureReason::Acquire.as_str(), "acquire");
    }

    #[test]
    fn test_cycle_outcome_category() {
        let outcome = CycleOutcome::Failed {
            reason: FailureReason::Transport,
            raw_json: None,
        };
        assert!(outcome.is_failed());
        assert_eq!(outcome.category(), None);
    }
}
