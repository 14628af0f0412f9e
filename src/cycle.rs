//! The capture/classify/signal/publish loop.
//!
//! One cycle acquires a frame, classifies it, maps the best tag to a category,
//! shows the matching indicator state and publishes the result. Cycles run
//! one after another with a fixed delay in between. Nothing that goes wrong
//! inside a cycle escapes it: the failure is logged, the indicator shows
//! [`IndicatorState::All`] and the loop carries on.

use crate::capture::FrameSource;
use crate::category::CategoryClassifier;
use crate::client::ClassificationClient;
use crate::indicator::{IndicatorController, IndicatorState, OutputLines};
use crate::messages::FailureMarker;
use crate::telemetry::{DeliveryStatus, TelemetryPublisher};
use crate::types::{Category, ClassificationOutcome, CycleOutcome, FailureReason};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_secs(1);

/// Running totals since the loop started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub classified: u64,
    pub failed: u64,
}

/// What a single cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub indicator: IndicatorState,
    /// Message handed to the publisher
    pub payload: String,
    /// Resolves when the message is confirmed; the loop never waits on it
    pub delivery: JoinHandle<DeliveryStatus>,
}

pub struct CycleLoop<L: OutputLines> {
    image_path: PathBuf,
    source: Box<dyn FrameSource>,
    client: ClassificationClient,
    categories: CategoryClassifier,
    indicator: IndicatorController<L>,
    publisher: TelemetryPublisher,
    cycle_delay: Duration,
    stats: CycleStats,
}

impl<L: OutputLines> CycleLoop<L> {
    pub fn new<P: AsRef<Path>>(
        image_path: P,
        source: Box<dyn FrameSource>,
        client: ClassificationClient,
        indicator: IndicatorController<L>,
        publisher: TelemetryPublisher,
    ) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            source,
            client,
            categories: CategoryClassifier::new(),
            indicator,
            publisher,
            cycle_delay: DEFAULT_CYCLE_DELAY,
            stats: CycleStats::default(),
        }
    }

    pub fn with_cycle_delay(mut self, cycle_delay: Duration) -> Self {
        self.cycle_delay = cycle_delay;
        self
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn indicator(&self) -> &IndicatorController<L> {
        &self.indicator
    }

    pub fn publisher(&self) -> &TelemetryPublisher {
        &self.publisher
    }

    /// Run cycles until `shutdown` resolves, then clear the indicator.
    ///
    /// Shutdown is observed both while a cycle is in flight (the cycle is
    /// dropped, cancelling any pending request) and during the delay.
    pub async fn run<F>(&mut self, shutdown: F) -> CycleStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            "Sending images from {} to {} every {:?}",
            self.image_path.display(),
            self.client.endpoint(),
            self.cycle_delay
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.run_cycle() => {}
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.cycle_delay) => {}
            }
        }

        self.indicator.set_state(IndicatorState::Off);
        info!(
            "Stopped after {} cycles ({} classified, {} failed, {} confirmations)",
            self.stats.cycles,
            self.stats.classified,
            self.stats.failed,
            self.publisher.confirmations()
        );
        self.stats
    }

    /// One full pass: acquire, classify, map, indicate, publish.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let outcome = self.evaluate().await;

        let state = IndicatorState::for_category(outcome.category());
        self.indicator.set_state(state);

        let payload = telemetry_payload(&outcome);
        debug!("Publishing to {}: {}", self.publisher.output(), payload);
        let delivery = self.publisher.publish(payload.clone());

        self.stats.cycles += 1;
        match &outcome {
            CycleOutcome::Classified {
                category,
                prediction,
                ..
            } => {
                self.stats.classified += 1;
                info!(
                    "Cycle {}: {} -> {} ({}), indicator {}",
                    self.stats.cycles,
                    prediction.tag_name,
                    category,
                    category.label(),
                    state
                );
            }
            CycleOutcome::Failed { reason, .. } => {
                self.stats.failed += 1;
                warn!(
                    "Cycle {} failed ({}), indicator {}",
                    self.stats.cycles, reason, state
                );
            }
        }

        CycleReport {
            outcome,
            indicator: state,
            payload,
            delivery,
        }
    }

    async fn evaluate(&mut self) -> CycleOutcome {
        if let Err(e) = self.source.acquire(&self.image_path).await {
            error!("Frame acquisition failed: {}", e);
            return CycleOutcome::Failed {
                reason: FailureReason::Acquire,
                raw_json: None,
            };
        }

        let classification = match self
            .client
            .classify(&self.image_path, &mut self.indicator)
            .await
        {
            Ok(classification) => classification,
            Err(e) => {
                error!("{}", e);
                return CycleOutcome::Failed {
                    reason: FailureReason::ImageRead,
                    raw_json: None,
                };
            }
        };

        match classification {
            ClassificationOutcome::Success {
                prediction,
                raw_json,
            } => {
                let category = self.categories.classify(&prediction.tag_name);
                if category == Category::Unknown {
                    info!("Tag {} belongs to no category", prediction.tag_name);
                }
                CycleOutcome::Classified {
                    category,
                    prediction,
                    raw_json,
                }
            }
            ClassificationOutcome::Failed { reason, raw_json } => {
                CycleOutcome::Failed { reason, raw_json }
            }
        }
    }
}

/// Raw classifier JSON when there is one, otherwise a failure marker.
pub fn telemetry_payload(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Classified { raw_json, .. } => raw_json.clone(),
        CycleOutcome::Failed {
            raw_json: Some(raw_json),
            ..
        } => raw_json.clone(),
        CycleOutcome::Failed {
            reason,
            raw_json: None,
        } => FailureMarker::new(reason).to_json(),
    }
}
