//! Brand voice: profile storage, copy analysis and prompt context.

pub mod analyzer;
pub mod repository;
pub mod service;

pub use analyzer::{StyleScores, StyleSignal, analyze_style, derive_guidelines};
pub use repository::BrandProfileRepository;
pub use service::{BrandVoiceService, DEFAULT_VOICE_CONTEXT};
