/// Port-level failure reported by a progress store, event log or catalog
/// implementation. The engine never retries; callers own backoff policy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}
