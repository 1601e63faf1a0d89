use std::collections::BTreeMap;

use chrono::{TimeDelta, Utc};

use tagstore_api::{Fingerprint, FingerprintStrategy, Record, RecordPatch, StoreError};

// ═══════════════════════════════════════════════════════════════
//  Outcomes
// ═══════════════════════════════════════════════════════════════

/// A record together with the fingerprint of exactly that content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub record: Record,
    pub fingerprint: Fingerprint,
}

/// Result of a conditional read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The presented fingerprint is current; the caller's copy is valid.
    Unchanged { fingerprint: Fingerprint },
    /// No fingerprint presented, or it is stale.
    Modified(Versioned),
}

// ═══════════════════════════════════════════════════════════════
//  ResourceStore
// ═══════════════════════════════════════════════════════════════

/// In-memory record collection guarded by fingerprints.
///
/// Synchronous and single-owner: `read` borrows, `update` needs `&mut`.
/// Share it between tasks through [`crate::SharedStore`].
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    records: BTreeMap<u64, Record>,
    strategy: FingerprintStrategy,
}

impl ResourceStore {
    pub fn new(strategy: FingerprintStrategy) -> Self {
        Self {
            records: BTreeMap::new(),
            strategy,
        }
    }

    /// Store with the default seed: Alice (1) and Bob (2).
    pub fn seeded(strategy: FingerprintStrategy) -> Self {
        Self::from_records(
            strategy,
            [
                Record::new(1, "Alice", "alice@example.com"),
                Record::new(2, "Bob", "bob@example.com"),
            ],
        )
    }

    pub fn from_records(
        strategy: FingerprintStrategy,
        records: impl IntoIterator<Item = Record>,
    ) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            strategy,
        }
    }

    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn ids(&self) -> Vec<u64> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fingerprint(&self, record: &Record) -> Result<Fingerprint, StoreError> {
        Ok(self.strategy.compute(record)?)
    }

    /// Conditional read.
    ///
    /// Returns `Unchanged` only when `presented` equals the current
    /// fingerprint.
    pub fn read(&self, id: u64, presented: Option<&Fingerprint>) -> Result<ReadOutcome, StoreError> {
        let record = self.records.get(&id).ok_or(StoreError::NotFound(id))?;
        let fingerprint = self.fingerprint(record)?;

        if presented == Some(&fingerprint) {
            return Ok(ReadOutcome::Unchanged { fingerprint });
        }

        Ok(ReadOutcome::Modified(Versioned {
            record: record.clone(),
            fingerprint,
        }))
    }

    /// Check the update preconditions without mutating anything.
    ///
    /// Same order as `update`: unknown id, missing fingerprint, stale
    /// fingerprint. Returns the current fingerprint on success.
    pub fn precondition(
        &self,
        id: u64,
        presented: Option<&Fingerprint>,
    ) -> Result<Fingerprint, StoreError> {
        let record = self.records.get(&id).ok_or(StoreError::NotFound(id))?;
        check_presented(self.strategy, record, presented)
    }

    /// Optimistic-locked update.
    ///
    /// Nothing is mutated unless `presented` is the current fingerprint.
    /// The new `updated_at` is at least one millisecond past the previous
    /// one, so weak fingerprints advance on every write.
    pub fn update(
        &mut self,
        id: u64,
        presented: Option<&Fingerprint>,
        patch: RecordPatch,
    ) -> Result<Versioned, StoreError> {
        let strategy = self.strategy;
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        check_presented(strategy, record, presented)?;

        let now = Utc::now().max(record.updated_at + TimeDelta::milliseconds(1));
        let mut updated = record.clone();
        updated.apply(patch, now);
        let fingerprint = strategy.compute(&updated)?;
        *record = updated.clone();

        Ok(Versioned {
            record: updated,
            fingerprint,
        })
    }
}

fn check_presented(
    strategy: FingerprintStrategy,
    record: &Record,
    presented: Option<&Fingerprint>,
) -> Result<Fingerprint, StoreError> {
    let presented = presented.ok_or(StoreError::PreconditionRequired)?;
    let current = strategy.compute(record)?;
    if *presented != current {
        return Err(StoreError::PreconditionFailed { current });
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(id: u64, name: &str) -> Record {
        Record {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn store(strategy: FingerprintStrategy) -> ResourceStore {
        ResourceStore::from_records(strategy, [fixed(1, "Alice"), fixed(2, "Bob")])
    }

    fn current(store: &ResourceStore, id: u64) -> Fingerprint {
        match store.read(id, None).unwrap() {
            ReadOutcome::Modified(v) => v.fingerprint,
            ReadOutcome::Unchanged { .. } => panic!("read without fingerprint must return the record"),
        }
    }

    #[test]
    fn test_seeded_store() {
        let store = ResourceStore::seeded(FingerprintStrategy::Strong);
        assert_eq!(store.ids(), vec![1, 2]);
        assert_eq!(store.get(1).unwrap().name, "Alice");
        assert_eq!(store.get(2).unwrap().email, "bob@example.com");
        assert!(!store.is_empty());
    }

    #[test]
    fn test_read_unknown_id() {
        let store = store(FingerprintStrategy::Strong);
        assert!(matches!(store.read(42, None), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_read_is_stable() {
        let store = store(FingerprintStrategy::Strong);
        assert_eq!(current(&store, 1), current(&store, 1));
        assert_ne!(current(&store, 1), current(&store, 2));
    }

    #[test]
    fn test_read_with_current_fingerprint_is_unchanged() {
        let store = store(FingerprintStrategy::Strong);
        let f = current(&store, 1);
        match store.read(1, Some(&f)).unwrap() {
            ReadOutcome::Unchanged { fingerprint } => assert_eq!(fingerprint, f),
            other => panic!("expected Unchanged, got {other:?}"),
        }
    }

    #[test]
    fn test_read_with_other_fingerprint_returns_record() {
        let store = store(FingerprintStrategy::Strong);
        let stale = Fingerprint::parse("deadbeef").unwrap();
        match store.read(1, Some(&stale)).unwrap() {
            ReadOutcome::Modified(v) => {
                assert_eq!(v.record, fixed(1, "Alice"));
                assert_eq!(v.fingerprint, current(&store, 1));
            }
            other => panic!("expected Modified, got {other:?}"),
        }
    }

    #[test]
    fn test_update_without_fingerprint_is_refused() {
        let mut store = store(FingerprintStrategy::Strong);
        let before = store.clone();
        let err = store.update(1, None, RecordPatch::name("X")).unwrap_err();
        assert!(matches!(err, StoreError::PreconditionRequired));
        assert_eq!(store.get(1), before.get(1));
    }

    #[test]
    fn test_update_unknown_id_wins_over_missing_fingerprint() {
        let mut store = store(FingerprintStrategy::Strong);
        let err = store.update(7, None, RecordPatch::name("X")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(7)));
    }

    #[test]
    fn test_update_with_stale_fingerprint_is_rejected() {
        let mut store = store(FingerprintStrategy::Strong);
        let f = current(&store, 1);
        let stale = Fingerprint::parse("0000").unwrap();

        let err = store.update(1, Some(&stale), RecordPatch::name("X")).unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed { current } if current == f));
        assert_eq!(store.get(1), Some(&fixed(1, "Alice")));
    }

    #[test]
    fn test_update_changes_only_patched_field() {
        let mut store = store(FingerprintStrategy::Strong);
        let f0 = current(&store, 1);

        let v = store.update(1, Some(&f0), RecordPatch::name("X")).unwrap();
        assert_eq!(v.record.id, 1);
        assert_eq!(v.record.name, "X");
        assert_eq!(v.record.email, "alice@example.com");
        assert!(v.record.updated_at > fixed(1, "Alice").updated_at);
        assert_ne!(v.fingerprint, f0);

        assert_eq!(store.get(1), Some(&v.record));
        assert_eq!(current(&store, 1), v.fingerprint);
        assert_eq!(store.get(2), Some(&fixed(2, "Bob")));
    }

    #[test]
    fn test_lost_update_is_prevented() {
        let mut store = store(FingerprintStrategy::Strong);
        let f0 = current(&store, 1);

        let first = store.update(1, Some(&f0), RecordPatch::name("Alicia")).unwrap();
        let f1 = first.fingerprint;
        assert_ne!(f1, f0);

        match store.update(1, Some(&f0), RecordPatch::name("Bob")) {
            Err(StoreError::PreconditionFailed { current }) => assert_eq!(current, f1),
            other => panic!("expected PreconditionFailed, got {other:?}"),
        }
        assert_eq!(store.get(1).unwrap().name, "Alicia");
    }

    #[test]
    fn test_weak_strategy_roundtrip() {
        let mut store = store(FingerprintStrategy::Weak);
        let f0 = current(&store, 1);
        assert!(f0.as_str().starts_with("W/"));

        let v = store.update(1, Some(&f0), RecordPatch::email("a@example.org")).unwrap();
        assert!(v.fingerprint.as_str().starts_with("W/"));
        assert_ne!(v.fingerprint, f0);
        assert!(matches!(
            store.read(1, Some(&v.fingerprint)).unwrap(),
            ReadOutcome::Unchanged { .. }
        ));
    }

    #[test]
    fn test_strong_tag_does_not_satisfy_weak_store() {
        let strong = store(FingerprintStrategy::Strong);
        let mut weak = store(FingerprintStrategy::Weak);
        let f = current(&strong, 1);
        assert!(matches!(
            weak.update(1, Some(&f), RecordPatch::name("X")),
            Err(StoreError::PreconditionFailed { .. })
        ));
    }

    #[test]
    fn test_weak_store_rejects_stale_writer_in_quick_succession() {
        for _ in 0..200 {
            let mut store = ResourceStore::seeded(FingerprintStrategy::Weak);
            let f0 = current(&store, 1);

            let first = store.update(1, Some(&f0), RecordPatch::name("Alicia")).unwrap();
            assert_ne!(first.fingerprint, f0);

            match store.update(1, Some(&f0), RecordPatch::name("Bob")) {
                Err(StoreError::PreconditionFailed { current }) => assert_eq!(current, first.fingerprint),
                other => panic!("expected PreconditionFailed, got {other:?}"),
            }
            assert_eq!(store.get(1).unwrap().name, "Alicia");
        }
    }

    #[test]
    fn test_updated_at_always_advances() {
        let mut store = ResourceStore::seeded(FingerprintStrategy::Weak);
        let mut previous = store.get(1).unwrap().updated_at;
        for i in 0..50 {
            let f = current(&store, 1);
            let v = store.update(1, Some(&f), RecordPatch::name(format!("n{i}"))).unwrap();
            assert!(v.record.updated_at.timestamp_millis() > previous.timestamp_millis());
            previous = v.record.updated_at;
        }
    }

    #[test]
    fn test_precondition_order_without_mutation() {
        let store = store(FingerprintStrategy::Strong);
        let f = current(&store, 1);
        let stale = Fingerprint::parse("0000").unwrap();

        assert!(matches!(store.precondition(9, None), Err(StoreError::NotFound(9))));
        assert!(matches!(store.precondition(1, None), Err(StoreError::PreconditionRequired)));
        assert!(matches!(
            store.precondition(1, Some(&stale)),
            Err(StoreError::PreconditionFailed { current }) if current == f
        ));
        assert_eq!(store.precondition(1, Some(&f)).unwrap(), f);
        assert_eq!(store.get(1), Some(&fixed(1, "Alice")));
    }
}
