use crate::fingerprint::Fingerprint;

/// Outcome of a store operation that did not produce a record.
///
/// All variants are terminal: the store never retries. After
/// `PreconditionFailed` the caller re-reads and retries with the
/// reported fingerprint.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(u64),

    #[error("update requires a fingerprint of the version being replaced")]
    PreconditionRequired,

    #[error("fingerprint is stale, current is {current}")]
    PreconditionFailed { current: Fingerprint },

    #[error("serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// The current fingerprint carried by a mismatch, if any.
    pub fn current_fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            StoreError::PreconditionFailed { current } => Some(current),
            _ => None,
        }
    }
}
