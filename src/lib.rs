//! Waste sorter edge agent.
//!
//! Repeatedly captures a frame, has a remote image classifier label it, maps
//! the label to a waste category, shows the category on five indicator lines
//! and forwards the classifier's answer to a telemetry sink.

pub mod capture;
pub mod category;
pub mod client;
pub mod config;
pub mod cycle;
mod error;
pub mod indicator;
pub mod messages;
pub mod telemetry;
pub mod types;

pub use category::CategoryClassifier;
pub use client::ClassificationClient;
pub use cycle::{CycleLoop, CycleReport, CycleStats};
pub use error::{AcquisitionError, ClassificationError, ConfigError, PublishError, TransportError};
pub use indicator::{IndicatorController, IndicatorState};
pub use telemetry::TelemetryPublisher;
pub use types::{Category, ClassificationOutcome, CycleOutcome, FailureReason, Prediction};
