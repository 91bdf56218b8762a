//! Shared domain types for Brandmind.
//!
//! This crate contains the domain types used across the Brandmind memory
//! layer: stored content, retrieval queries and results, brand profiles,
//! feedback events, preferences, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod feedback;
pub mod preference;
pub mod profile;
pub mod retrieval;
