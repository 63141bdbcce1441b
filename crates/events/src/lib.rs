//! Domain events and the mechanics for publishing them.
//!
//! Services publish an [`EventEnvelope`] only after the corresponding write has
//! been committed to its store. Subscribers (telemetry sinks, display pollers,
//! tests) receive copies; the stores remain the source of truth.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::{EventEnvelope, JsonEnvelope};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
