use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CounterKey, CounterRecord, CounterStore};
use crate::error::{Error, Result};
use crate::sequence::Sequence;

/// Process-local counter store.
///
/// Every operation runs inside one critical section, which gives the same per-key
/// atomicity as the Postgres store for callers within this process.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counts: Mutex<BTreeMap<CounterKey, i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every counter, ordered by key.
    pub fn records(&self) -> Vec<CounterRecord> {
        self.counts()
            .iter()
            .map(|(key, &count)| CounterRecord {
                model: key.model.clone(),
                field: key.field.clone(),
                count,
            })
            .collect()
    }

    fn counts(&self) -> MutexGuard<'_, BTreeMap<CounterKey, i64>> {
        // A panic while holding the lock cannot leave a half-written count.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        let mut counts = self.counts();
        let next = sequence
            .next_after(counts.get(key).copied())
            .ok_or_else(|| Error::Overflow { key: key.clone() })?;
        counts.insert(key.clone(), next);
        Ok(next)
    }

    async fn peek(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        sequence
            .next_after(self.counts().get(key).copied())
            .ok_or_else(|| Error::Overflow { key: key.clone() })
    }

    async fn reset(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        let seed = sequence
            .seed()
            .ok_or_else(|| Error::Overflow { key: key.clone() })?;
        self.counts().insert(key.clone(), seed);
        Ok(sequence.start_at)
    }

    async fn advance_to(&self, key: &CounterKey, value: i64) -> Result<()> {
        let mut counts = self.counts();
        let count = counts.entry(key.clone()).or_insert(value);
        *count = (*count).max(value);
        Ok(())
    }

    async fn record(&self, key: &CounterKey) -> Result<Option<CounterRecord>> {
        Ok(self.counts().get(key).map(|&count| CounterRecord {
            model: key.model.clone(),
            field: key.field.clone(),
            count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;

    fn user_id() -> CounterKey {
        CounterKey::new("User", "_id")
    }

    #[tokio::test]
    async fn fresh_counter_counts_from_zero() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::default();
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 0);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 1);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn start_and_step_are_honored() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::new(3, 5);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 3);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 8);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::default();
        let other = CounterKey::new("User", "userId");
        store.increment(&user_id(), seq).await.unwrap();
        store.increment(&user_id(), seq).await.unwrap();
        assert_eq!(store.increment(&other, seq).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn peek_does_not_mutate() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::starting_from(7);
        for _ in 0..3 {
            assert_eq!(store.peek(&user_id(), seq).await.unwrap(), 7);
        }
        assert!(store.record(&user_id()).await.unwrap().is_none());
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 7);
        assert_eq!(store.peek(&user_id(), seq).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn reset_replays_fresh_sequence() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::new(10, 2);
        store.increment(&user_id(), seq).await.unwrap();
        store.increment(&user_id(), seq).await.unwrap();

        assert_eq!(store.reset(&user_id(), seq).await.unwrap(), 10);
        assert_eq!(store.peek(&user_id(), seq).await.unwrap(), 10);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 10);
        assert_eq!(store.increment(&user_id(), seq).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn advance_only_raises() {
        let store = MemoryCounterStore::new();
        let seq = Sequence::default();
        store.advance_to(&user_id(), 10).await.unwrap();
        assert_eq!(store.peek(&user_id(), seq).await.unwrap(), 11);

        store.advance_to(&user_id(), 4).await.unwrap();
        assert_eq!(store.record(&user_id()).await.unwrap().unwrap().count, 10);
    }

    #[tokio::test]
    async fn overflow_is_an_error() {
        let store = MemoryCounterStore::new();
        store.advance_to(&user_id(), i64::MAX).await.unwrap();
        let err = store
            .increment(&user_id(), Sequence::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Overflow { .. }));
        assert_eq!(store.records()[0].count, i64::MAX);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_distinct() {
        let store = Arc::new(MemoryCounterStore::new());
        let seq = Sequence::new(5, 3);
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment(&user_id(), seq).await.unwrap() })
            })
            .collect();

        let mut issued = BTreeSet::new();
        for task in tasks {
            assert!(issued.insert(task.await.unwrap()));
        }
        let expected: BTreeSet<i64> = (0..64).map(|i| 5 + i * 3).collect();
        assert_eq!(issued, expected);
    }
}
