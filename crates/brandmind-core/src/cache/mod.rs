//! Bounded, time-boxed in-memory caching.
//!
//! `BoundedTtlCache` is the primitive; `CacheRegistry` owns the embedding,
//! query-result, and brand-profile instances shared by the services.

pub mod registry;
pub mod ttl;

pub use registry::{CacheRegistry, CacheStats};
pub use ttl::{BoundedTtlCache, CacheEntry};
