//! # Sample Subscribers
//!
//! Sessions notify subscribers synchronously on the thread that processes the
//! report. Hosts that must not block report processing register a
//! [`ChannelSubscriber`] and drain the receiving end elsewhere.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use super::sample::MotionSample;
use crate::error::{MotionError, Result};

/// A new sample together with its delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionEvent {
    /// Identifier of the controller session that produced the sample
    pub device_id: String,
    /// Host wall-clock time the report was received
    pub received_at: DateTime<Utc>,
    pub sample: MotionSample,
}

/// Receives every sample a session builds.
#[cfg_attr(test, mockall::automock)]
pub trait SampleSubscriber: Send {
    /// Called once per processed report, before `process_report` returns.
    fn on_sample(&mut self, event: &MotionEvent) -> Result<()>;
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<MotionEvent>,
}

impl ChannelSubscriber {
    /// Creates a subscriber and the receiver the host drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MotionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SampleSubscriber for ChannelSubscriber {
    fn on_sample(&mut self, event: &MotionEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| MotionError::ChannelClosed)
    }
}

/// Ordered list of subscribers for one session.
#[derive(Default)]
pub struct SubscriberList {
    subscribers: Vec<Box<dyn SampleSubscriber>>,
}

impl std::fmt::Debug for SubscriberList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.subscribers.len())
            .finish()
    }
}

impl SubscriberList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscriber: Box<dyn SampleSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every subscriber in registration order.
    ///
    /// A failing subscriber is logged and skipped; the others still run.
    /// Returns the number of failures.
    pub fn notify(&mut self, event: &MotionEvent) -> usize {
        let mut failures = 0;
        for (index, subscriber) in self.subscribers.iter_mut().enumerate() {
            if let Err(e) = subscriber.on_sample(event) {
                warn!(
                    "Subscriber {} failed for device {}: {}",
                    index, event.device_id, e
                );
                failures += 1;
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::protocol::Resolution;

    fn event(ts: u64) -> MotionEvent {
        MotionEvent {
            device_id: "ds4-test".to_string(),
            received_at: Utc::now(),
            sample: MotionSample::new(ts, [1.0, 2.0, 3.0], [0.0, 0.0, 1.0], Resolution::DS4),
        }
    }

    #[test]
    fn test_notify_calls_every_subscriber() {
        let mut first = MockSampleSubscriber::new();
        first
            .expect_on_sample()
            .withf(|e| e.sample.timestamp_us() == 10)
            .times(1)
            .returning(|_| Ok(()));

        let mut second = MockSampleSubscriber::new();
        second.expect_on_sample().times(1).returning(|_| Ok(()));

        let mut list = SubscriberList::new();
        list.push(Box::new(first));
        list.push(Box::new(second));

        assert_eq!(list.notify(&event(10)), 0);
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_others() {
        let mut failing = MockSampleSubscriber::new();
        failing
            .expect_on_sample()
            .times(1)
            .returning(|_| Err(MotionError::ChannelClosed));

        let mut healthy = MockSampleSubscriber::new();
        healthy.expect_on_sample().times(1).returning(|_| Ok(()));

        let mut list = SubscriberList::new();
        list.push(Box::new(failing));
        list.push(Box::new(healthy));

        assert_eq!(list.notify(&event(1)), 1);
    }

    #[test]
    fn test_empty_list_notifies_nothing() {
        let mut list = SubscriberList::new();
        assert!(list.is_empty());
        assert_eq!(list.notify(&event(1)), 0);
    }

    #[tokio::test]
    async fn test_channel_subscriber_delivers_in_order() {
        let (mut subscriber, mut rx) = ChannelSubscriber::new();
        tokio_test::assert_ok!(subscriber.on_sample(&event(1)));
        tokio_test::assert_ok!(subscriber.on_sample(&event(2)));

        assert_eq!(rx.recv().await.unwrap().sample.timestamp_us(), 1);
        assert_eq!(rx.recv().await.unwrap().sample.timestamp_us(), 2);
    }

    #[test]
    fn test_channel_subscriber_closed_receiver() {
        let (mut subscriber, rx) = ChannelSubscriber::new();
        drop(rx);
        assert!(matches!(
            subscriber.on_sample(&event(1)),
            Err(MotionError::ChannelClosed)
        ));
    }

    #[test]
    fn test_event_serializes_to_json() {
        let json = serde_json::to_value(event(99)).unwrap();
        assert_eq!(json["device_id"], "ds4-test");
        assert_eq!(json["sample"]["timestamp_us"], 99);
        assert!(json["received_at"].is_string());
    }
}
