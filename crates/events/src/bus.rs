//! Fan-out of committed events to listeners.
//!
//! The bus is not storage: a listener that subscribes late misses whatever was
//! published before it, and the stores stay authoritative.

use std::sync::mpsc::{Receiver, TryRecvError};

/// One listener's queue of published messages.
///
/// Messages from a single publisher arrive in publish order.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Publish/subscribe seam shared by request handlers and services.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}
