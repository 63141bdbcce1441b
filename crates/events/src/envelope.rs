use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::Event;

/// Envelope around a published event: identity, source aggregate and payload.
///
/// `sequence_number` is the version of the source aggregate after the write
/// that produced the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    aggregate_id: Uuid,
    aggregate_type: String,
    sequence_number: u64,

    event_type: String,
    event_version: u32,
    occurred_at: DateTime<Utc>,

    payload: E,
}

/// Envelope with a JSON payload, the form that crosses crate boundaries.
pub type JsonEnvelope = EventEnvelope<JsonValue>;

impl<E> EventEnvelope<E> {
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<JsonValue> {
    /// Wrap a typed event, serializing its payload to JSON.
    pub fn from_typed<E>(
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        event: &E,
    ) -> Result<Self, serde_json::Error>
    where
        E: Event + Serialize,
    {
        Ok(Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)?,
        })
    }
}
