//! Post-commit event publication.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use galley_events::{Event, EventBus, InMemoryEventBus, JsonEnvelope};

pub type DomainBus = InMemoryEventBus<JsonEnvelope>;

/// Publishes committed facts to the bus.
///
/// Called only after the write is stored. A failure here is logged and
/// swallowed: the write stands, subscribers just miss the message.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    bus: Arc<DomainBus>,
}

impl EventPublisher {
    pub fn new(bus: Arc<DomainBus>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Arc<DomainBus> {
        &self.bus
    }

    pub fn publish<E>(&self, aggregate_id: Uuid, aggregate_type: &str, sequence: u64, event: &E)
    where
        E: Event + Serialize,
    {
        let envelope = match JsonEnvelope::from_typed(aggregate_id, aggregate_type, sequence, event) {
            Ok(env) => env,
            Err(e) => {
                tracing::error!(
                    event_type = event.event_type(),
                    error = %e,
                    "failed to serialize committed event"
                );
                return;
            }
        };
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(
                event_type = event.event_type(),
                aggregate_type,
                %aggregate_id,
                error = ?e,
                "failed to publish committed event"
            );
        }
    }
}
