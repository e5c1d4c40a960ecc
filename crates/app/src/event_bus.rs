//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use framebot_domain::error::FramebotError;
use framebot_domain::run::RunEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<RunEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: RunEvent) -> impl Future<Output = Result<(), FramebotError>> + Send {
        // Fails only with zero receivers.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
