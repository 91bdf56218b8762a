//! Broadcast bus for `LearningEvent`s.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers
//! is a no-op, so background tasks can report unconditionally.

use brandmind_types::event::LearningEvent;
use tokio::sync::broadcast;

/// Default channel capacity for a process-wide bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Multi-consumer bus shared by the learner and the brand-voice service.
///
/// Cloning the bus clones the sender.
#[derive(Clone)]
pub struct LearningEventBus {
    sender: broadcast::Sender<LearningEvent>,
}

impl LearningEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create a subscriber that receives all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LearningEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: LearningEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for LearningEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for LearningEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningEventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
