//! Event bus port: publish run progress to interested subscribers.

use std::future::Future;

use framebot_domain::error::FramebotError;
use framebot_domain::run::RunEvent;

/// Publishes run events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: RunEvent) -> impl Future<Output = Result<(), FramebotError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: RunEvent) -> impl Future<Output = Result<(), FramebotError>> + Send {
        (**self).publish(event)
    }
}
