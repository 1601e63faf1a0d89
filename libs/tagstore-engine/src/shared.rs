use std::sync::Arc;

use tokio::sync::RwLock;

use tagstore_api::{Fingerprint, FingerprintStrategy, RecordPatch, StoreError};

use crate::store::{ReadOutcome, ResourceStore, Versioned};

/// `ResourceStore` behind a lock, for concurrent callers.
///
/// Reads share the lock. An update holds the write lock across the
/// fingerprint comparison and the assignment, so two writers presenting
/// the same fingerprint can never both succeed.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<ResourceStore>>,
    strategy: FingerprintStrategy,
}

impl SharedStore {
    pub fn new(store: ResourceStore) -> Self {
        let strategy = store.strategy();
        Self {
            inner: Arc::new(RwLock::new(store)),
            strategy,
        }
    }

    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    #[cfg(test)]
    pub(crate) async fn get(&self, id: u64) -> Option<tagstore_api::Record> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn read(
        &self,
        id: u64,
        presented: Option<&Fingerprint>,
    ) -> Result<ReadOutcome, StoreError> {
        let store = self.inner.read().await;
        let outcome = store.read(id, presented);
        match &outcome {
            Ok(ReadOutcome::Unchanged { fingerprint }) => {
                tracing::debug!(id, etag = %fingerprint, "read: unchanged");
            }
            Ok(ReadOutcome::Modified(v)) => {
                tracing::debug!(id, etag = %v.fingerprint, conditional = presented.is_some(), "read: full record");
            }
            Err(e) => {
                tracing::debug!(id, error = %e, "read rejected");
            }
        }
        outcome
    }

    /// Update preconditions only, under the read lock. Lets a caller
    /// report 404/428/412 before complaining about a malformed body.
    pub async fn precondition(
        &self,
        id: u64,
        presented: Option<&Fingerprint>,
    ) -> Result<Fingerprint, StoreError> {
        self.inner.read().await.precondition(id, presented)
    }

    pub async fn update(
        &self,
        id: u64,
        presented: Option<&Fingerprint>,
        patch: RecordPatch,
    ) -> Result<Versioned, StoreError> {
        let mut store = self.inner.write().await;
        let outcome = store.update(id, presented, patch);
        match &outcome {
            Ok(v) => {
                tracing::info!(id, etag = %v.fingerprint, "record updated");
            }
            Err(e) => match e.current_fingerprint() {
                Some(current) => tracing::warn!(
                    id,
                    presented = ?presented.map(Fingerprint::as_str),
                    current = %current,
                    "update rejected: stale fingerprint"
                ),
                None => tracing::debug!(id, error = %e, "update rejected"),
            },
        }
        outcome
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
