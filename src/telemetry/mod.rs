//! Telemetry publishing
//!
//! Each cycle publishes one message to an output channel (`output1` by
//! default). Publishing is fire-and-forget: the message is handed to a
//! [`Transport`] on a background task bounded by the message timeout, and a
//! shared counter records every delivery confirmation, whatever its result.

use crate::error::PublishError;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

mod http;

pub use http::HttpTransport;

/// Time allowed for a message, measured from submission.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_millis(10000);
pub const DEFAULT_OUTPUT: &str = "output1";

/// An opaque message bound for an output channel.
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    pub id: u64,
    pub output: String,
    pub body: Vec<u8>,
}

impl TelemetryMessage {
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Result reported by a delivery confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Ok,
    Error,
    Timeout,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryStatus::Ok => "OK",
            DeliveryStatus::Error => "ERROR",
            DeliveryStatus::Timeout => "MESSAGE_TIMEOUT",
        })
    }
}

/// Delivery mechanism behind the publisher.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &TelemetryMessage) -> Result<(), PublishError>;
}

/// Writes messages to the log instead of a remote sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, message: &TelemetryMessage) -> Result<(), PublishError> {
        info!(
            "Telemetry [{}] #{}: {}",
            message.output,
            message.id,
            message.body_str()
        );
        Ok(())
    }
}

pub struct TelemetryPublisher {
    transport: Arc<dyn Transport>,
    output: String,
    message_timeout: Duration,
    confirmations: Arc<AtomicU64>,
    next_id: AtomicU64,
}

impl TelemetryPublisher {
    /// `confirmations` is incremented once per confirmed message.
    pub fn new(
        transport: Arc<dyn Transport>,
        output: impl Into<String>,
        message_timeout: Duration,
        confirmations: Arc<AtomicU64>,
    ) -> Self {
        Self {
            transport,
            output: output.into(),
            message_timeout,
            confirmations,
            next_id: AtomicU64::new(1),
        }
    }

    /// Submit `payload` without waiting for delivery.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// resolves to the confirmation status; dropping it does not cancel
    /// delivery.
    pub fn publish(&self, payload: String) -> JoinHandle<DeliveryStatus> {
        let message = TelemetryMessage {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            output: self.output.clone(),
            body: payload.into_bytes(),
        };
        let transport = Arc::clone(&self.transport);
        let confirmations = Arc::clone(&self.confirmations);
        let message_timeout = self.message_timeout;

        tokio::spawn(async move {
            let status =
                match tokio::time::timeout(message_timeout, transport.send(&message)).await {
                    Ok(Ok(())) => DeliveryStatus::Ok,
                    Ok(Err(e)) => {
                        warn!("Message {} to {} failed: {}", message.id, message.output, e);
                        DeliveryStatus::Error
                    }
                    Err(_) => {
                        warn!(
                            "Message {} to {} failed: {}",
                            message.id,
                            message.output,
                            PublishError::Timeout(message_timeout)
                        );
                        DeliveryStatus::Timeout
                    }
                };
            let total = confirmations.fetch_add(1, Ordering::SeqCst) + 1;
            info!(
                "Confirmation received for message {} with result = {}",
                message.id, status
            );
            info!("Total calls confirmed: {}", total);
            status
        })
    }

    /// Confirmations received so far.
    pub fn confirmations(&self) -> u64 {
        self.confirmations.load(Ordering::SeqCst)
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn publisher(transport: Arc<dyn Transport>, counter: Arc<AtomicU64>) -> TelemetryPublisher {
        TelemetryPublisher::new(transport, DEFAULT_OUTPUT, DEFAULT_MESSAGE_TIMEOUT, counter)
    }

    #[tokio::test]
    async fn test_publish_delivers_and_counts() {
        let transport = RecordingTransport::default();
        let counter = Arc::new(AtomicU64::new(0));
        let publisher = publisher(Arc::new(transport.clone()), Arc::clone(&counter));

        let first = publisher.publish("one".to_string()).await.unwrap();
        let second = publisher.publish("two".to_string()).await.unwrap();

        assert_eq!(first, DeliveryStatus::Ok);
        assert_eq!(second, DeliveryStatus::Ok);
        assert_eq!(transport.bodies(), vec!["one", "two"]);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.confirmations(), 2);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].output, "output1");
        assert!(sent[0].id < sent[1].id);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_confirms() {
        let counter = Arc::new(AtomicU64::new(0));
        let publisher = publisher(Arc::new(FailingTransport), Arc::clone(&counter));

        let status = publisher.publish("payload".to_string()).await.unwrap();
        assert_eq!(status, DeliveryStatus::Error);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_confirms_after_message_timeout() {
        let counter = Arc::new(AtomicU64::new(0));
        let publisher = TelemetryPublisher::new(
            Arc::new(StalledTransport),
            DEFAULT_OUTPUT,
            Duration::from_millis(500),
            Arc::clone(&counter),
        );

        let handle = publisher.publish("payload".to_string());
        assert_eq!(handle.await.unwrap(), DeliveryStatus::Timeout);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_does_not_wait_for_delivery() {
        let counter = Arc::new(AtomicU64::new(0));
        let publisher = publisher(Arc::new(StalledTransport), Arc::clone(&counter));

        let handle = publisher.publish("payload".to_string());
        // Returned immediately with the delivery still pending
        assert!(!handle.is_finished());
        assert_eq!(publisher.confirmations(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_counter_is_shared() {
        let counter = Arc::new(AtomicU64::new(5));
        let publisher = publisher(Arc::new(LogTransport), Arc::clone(&counter));
        publisher.publish("x".to_string()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }
}
