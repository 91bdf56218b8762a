//! Feedback-driven preference learning.

pub mod learner;
pub mod repository;

pub use learner::FeedbackLearner;
pub use repository::{FeedbackRepository, PreferenceRepository};
