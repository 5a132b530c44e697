//! Fire-and-forget notifications about completed searches.
//!
//! Downstream listeners (feed generators, analytics) subscribe to the bus;
//! the search handler never waits on them or fails when nobody listens.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast after a ranked search completed.
#[derive(Debug, Clone)]
pub struct MerchantsLoaded {
    pub request_id: String,
    pub merchant_ids: Vec<Uuid>,
    pub total: usize,
    pub distance_ranked: bool,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MerchantsLoaded>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub fn publish(&self, event: MerchantsLoaded) {
        let _ = self.sender.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MerchantsLoaded> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Spawn a listener that logs every published event at debug level.
pub fn spawn_logging_listener(bus: &EventBus) {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        request_id = %event.request_id,
                        returned = event.merchant_ids.len(),
                        total = event.total,
                        distance_ranked = event.distance_ranked,
                        "merchants loaded"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
