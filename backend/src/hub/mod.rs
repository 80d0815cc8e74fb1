// Broadcast hub: registry of live subscribers and best-effort fan-out.
// Invariants: broadcast sends to a snapshot of the registry taken at call time; a failed
// send unregisters only that subscriber and never aborts the remaining sends.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::utils::next_sequence;

pub type SubscriberId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryError {
    Closed,
    TimedOut,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Closed => f.write_str("connection closed"),
            DeliveryError::TimedOut => f.write_str("send timed out"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Sending half of one subscriber connection. The task owning the socket holds the receiver.
#[derive(Clone, Debug)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub peer: Option<SocketAddr>,
    tx: mpsc::Sender<String>,
}

impl Subscriber {
    pub fn channel(
        id: SubscriberId,
        peer: Option<SocketAddr>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, peer, tx }, rx)
    }

    pub async fn send(&self, payload: String, timeout: Duration) -> Result<(), DeliveryError> {
        self.tx
            .send_timeout(payload, timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
                SendTimeoutError::Timeout(_) => DeliveryError::TimedOut,
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub dropped: Vec<SubscriberId>,
}

pub struct Hub {
    registry: RwLock<HashMap<SubscriberId, Subscriber>>,
    sequence: AtomicU64,
    send_timeout: Duration,
    buffer: usize,
}

impl Hub {
    pub fn new(send_timeout: Duration, buffer: usize) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            send_timeout,
            buffer,
        }
    }

    /// Allocates a fresh subscriber id and channel; the subscriber is not registered yet.
    pub fn subscriber(&self, peer: Option<SocketAddr>) -> (Subscriber, mpsc::Receiver<String>) {
        let id = next_sequence(&self.sequence);
        Subscriber::channel(id, peer, self.buffer)
    }

    /// Returns false if the id was already registered.
    pub async fn register(&self, subscriber: Subscriber) -> bool {
        let mut registry = self.registry.write().await;
        match registry.entry(subscriber.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(subscriber);
                true
            }
        }
    }

    /// Returns false if the id was not registered.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        self.registry.write().await.remove(&id).is_some()
    }

    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.registry.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }

    pub async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let targets: Vec<Subscriber> = {
            let registry = self.registry.read().await;
            registry.values().cloned().collect()
        };
        let mut report = BroadcastReport {
            attempted: targets.len(),
            ..BroadcastReport::default()
        };
        if targets.is_empty() {
            return report;
        }

        let timeout = self.send_timeout;
        let results = join_all(
            targets
                .iter()
                .map(|subscriber| subscriber.send(payload.to_string(), timeout)),
        )
        .await;

        for (subscriber, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        id = subscriber.id,
                        peer = ?subscriber.peer,
                        %err,
                        "subscriber send failed; dropping"
                    );
                    self.unregister(subscriber.id).await;
                    report.dropped.push(subscriber.id);
                }
            }
        }
        debug!(
            attempted = report.attempted,
            delivered = report.delivered,
            "broadcast finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::sync::mpsc::error::TryRecvError;

    fn hub() -> Hub {
        Hub::new(Duration::from_millis(200), 4)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_registered_subscriber() {
        let hub = hub();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (subscriber, rx) = hub.subscriber(None);
            assert!(hub.register(subscriber).await);
            receivers.push(rx);
        }

        let report = hub.broadcast("{\"gesture\":\"1\"}").await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 3);
        assert!(report.dropped.is_empty());
        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), "{\"gesture\":\"1\"}");
        }
    }

    #[tokio::test]
    async fn failed_send_drops_only_that_subscriber() {
        let hub = hub();
        let (first, mut first_rx) = hub.subscriber(None);
        let (second, second_rx) = hub.subscriber(None);
        let (third, mut third_rx) = hub.subscriber(None);
        let second_id = second.id;
        hub.register(first).await;
        hub.register(second).await;
        hub.register(third).await;
        drop(second_rx);

        let report = hub.broadcast("m").await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, vec![second_id]);
        assert_eq!(first_rx.try_recv().unwrap(), "m");
        assert_eq!(third_rx.try_recv().unwrap(), "m");
        assert!(!hub.contains(second_id).await);
        assert_eq!(hub.len().await, 2);
    }

    #[tokio::test]
    async fn register_and_unregister_are_idempotent() {
        let hub = hub();
        let (subscriber, _rx) = hub.subscriber(None);
        let id = subscriber.id;

        assert!(hub.register(subscriber.clone()).await);
        assert!(!hub.register(subscriber).await);
        assert_eq!(hub.len().await, 1);

        assert!(hub.unregister(id).await);
        assert!(!hub.unregister(id).await);
        assert!(hub.is_empty().await);
    }

    #[tokio::test]
    async fn subscriber_ids_are_unique() {
        let hub = hub();
        let (a, _a_rx) = hub.subscriber(None);
        let (b, _b_rx) = hub.subscriber(None);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn empty_registry_broadcast_is_a_no_op() {
        let report = hub().broadcast("m").await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn registration_during_broadcast_waits_for_next_message() {
        let hub = Arc::new(Hub::new(Duration::from_secs(5), 1));
        let (slow, mut slow_rx) = hub.subscriber(None);
        hub.register(slow.clone()).await;
        slow.send("backlog".to_string(), Duration::from_millis(10))
            .await
            .unwrap();

        let in_flight = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.broadcast("first").await })
        };
        // let the broadcast snapshot the registry and block on the full channel
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!in_flight.is_finished());

        let (late, mut late_rx) = hub.subscriber(None);
        hub.register(late).await;

        assert_eq!(slow_rx.recv().await.unwrap(), "backlog");
        let report = in_flight.await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(slow_rx.recv().await.unwrap(), "first");
        assert_eq!(late_rx.try_recv(), Err(TryRecvError::Empty));

        let report = hub.broadcast("second").await;
        assert_eq!(report.delivered, 2);
        assert_eq!(late_rx.try_recv().unwrap(), "second");
        assert_eq!(slow_rx.try_recv().unwrap(), "second");
    }

    #[tokio::test]
    async fn stalled_subscriber_times_out_and_is_dropped() {
        let hub = Hub::new(Duration::from_millis(20), 1);
        let (stalled, _stalled_rx) = hub.subscriber(None);
        let (healthy, mut healthy_rx) = hub.subscriber(None);
        let stalled_id = stalled.id;
        hub.register(stalled.clone()).await;
        hub.register(healthy).await;
        stalled
            .send("backlog".to_string(), Duration::from_millis(10))
            .await
            .unwrap();

        let report = hub.broadcast("m").await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![stalled_id]);
        assert_eq!(healthy_rx.try_recv().unwrap(), "m");
        assert_eq!(hub.len().await, 1);
    }

    #[tokio::test]
    async fn closed_subscriber_is_gone_after_next_broadcast() {
        let hub = hub();
        let (staying, mut staying_rx) = hub.subscriber(None);
        let (leaving, leaving_rx) = hub.subscriber(None);
        hub.register(staying).await;
        hub.register(leaving).await;
        assert_eq!(hub.len().await, 2);

        drop(leaving_rx);
        let report = hub.broadcast("{\"gesture\":\"9\"}").await;
        assert_eq!(report.delivered, 1);
        assert_eq!(staying_rx.try_recv().unwrap(), "{\"gesture\":\"9\"}");
        assert_eq!(hub.len().await, 1);
    }

    #[tokio::test]
    async fn delivery_errors_are_reported() {
        let (subscriber, rx) = Subscriber::channel(7, None, 1);
        drop(rx);
        let err = subscriber
            .send("m".to_string(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::Closed);
        assert_eq!(err.to_string(), "connection closed");
    }
}
