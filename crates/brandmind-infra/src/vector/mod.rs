//! Vector storage for embedded content.
//!
//! Provides the LanceDB connection wrapper, the Arrow schema of the
//! per-owner content tables, and the repository that stores and searches
//! them.

pub mod content;
pub mod lance;
pub mod schema;
