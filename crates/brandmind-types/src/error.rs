use thiserror::Error;

/// Errors from repository operations (used by trait definitions in brandmind-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by an embedding model collaborator.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// The model endpoint was unreachable, timed out, or rate-limited.
    #[error("embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid embedding input: {0}")]
    InvalidInput(String),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Errors raised by a similarity search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("similarity search unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("similarity search failed: {0}")]
    Query(String),
}

/// Errors from storing content for later retrieval.
///
/// Embedding failures and persistence failures are reported separately so
/// callers can tell whether the vector was ever computed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to embed content: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("failed to persist content: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Errors related to brand profile writes.
#[derive(Debug, Error)]
pub enum BrandVoiceError {
    #[error("storage error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("invalid profile update: {0}")]
    InvalidUpdate(String),
}
