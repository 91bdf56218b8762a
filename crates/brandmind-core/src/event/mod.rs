//! Learning event bus.

pub mod bus;

pub use bus::{DEFAULT_EVENT_CAPACITY, LearningEventBus};
