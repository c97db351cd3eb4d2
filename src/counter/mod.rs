pub mod memory;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sequence::Sequence;

pub use memory::MemoryCounterStore;

/// Identity of one counter: the counter (collection) name and the field it numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    pub model: String,
    pub field: String,
}

impl CounterKey {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.field)
    }
}

/// Persisted counter state. `count` is the last value issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CounterRecord {
    pub model: String,
    pub field: String,
    pub count: i64,
}

impl CounterRecord {
    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.model.clone(), self.field.clone())
    }
}

/// Durable storage of one integer sequence per [`CounterKey`].
///
/// Implementations must make `increment` atomic per key: concurrent callers never
/// observe the same returned value, including callers in other processes sharing the
/// same backing store. Nothing is cached between calls.
pub trait CounterStore: Send + Sync {
    /// Advance the counter and return the newly issued value.
    /// Creates the counter at `sequence.start_at` if it does not exist.
    fn increment(
        &self,
        key: &CounterKey,
        sequence: Sequence,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// The value the next `increment` would return. Never mutates.
    fn peek(
        &self,
        key: &CounterKey,
        sequence: Sequence,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Rewind the counter so the next `increment` returns `sequence.start_at`.
    /// Returns that value.
    fn reset(
        &self,
        key: &CounterKey,
        sequence: Sequence,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Raise the counter's last issued value to `value` if it is currently lower.
    /// Never lowers a counter.
    fn advance_to(&self, key: &CounterKey, value: i64) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the stored record, if the counter exists.
    fn record(
        &self,
        key: &CounterKey,
    ) -> impl Future<Output = Result<Option<CounterRecord>>> + Send;
}
