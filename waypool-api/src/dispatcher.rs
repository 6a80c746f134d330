use tokio::sync::broadcast;
use tracing::trace;

use waypool_shared::{ServerEvent, Topic};

/// One topic-tagged event on the process-wide fan-out channel. Every
/// connection filters the stream down to its subscribed topics.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub topic: Topic,
    pub event: ServerEvent,
}

/// Best-effort, at-most-once fan-out of events to topic subscribers.
/// A subscriber that lags simply loses the overrun events; there is no
/// replay, clients re-derive state via a `ride:info` snapshot.
#[derive(Clone)]
pub struct Dispatcher {
    tx: broadcast::Sender<Envelope>,
}

impl Dispatcher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, topic: Topic, event: ServerEvent) {
        trace!(%topic, "broadcast");
        // No subscribers is not an error.
        let _ = self.tx.send(Envelope { topic, event });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_receive_published_envelopes() {
        let dispatcher = Dispatcher::new(16);
        let mut rx = dispatcher.subscribe();

        let ride_id = Uuid::new_v4();
        dispatcher.publish(Topic::Ride(ride_id), ServerEvent::RideEnded { ride_id });

        let env = rx.recv().await.unwrap();
        assert_eq!(env.topic, Topic::Ride(ride_id));
        assert!(matches!(env.event, ServerEvent::RideEnded { .. }));
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let dispatcher = Dispatcher::new(16);
        let ride_id = Uuid::new_v4();
        dispatcher.publish(Topic::Ride(ride_id), ServerEvent::RideEnded { ride_id });
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let dispatcher = Dispatcher::new(16);
        let ride_id = Uuid::new_v4();
        dispatcher.publish(Topic::Ride(ride_id), ServerEvent::RideEnded { ride_id });

        // Subscribed after emission: nothing is replayed.
        let mut rx = dispatcher.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
