//! Semantic retrieval: the search port and the caching engine.

pub mod engine;
pub mod search;

pub use engine::{MIN_CANDIDATES, RetrievalEngine, candidate_count};
pub use search::SimilaritySearch;
