use sqlx::PgPool;

use crate::counter::{CounterKey, CounterRecord, CounterStore};
use crate::error::{Error, Result};
use crate::sequence::Sequence;

/// Counter store backed by the `identity_counters` table.
///
/// Increments are a single `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement, so
/// Postgres row locking orders concurrent callers across every process sharing the
/// database.
#[derive(Debug, Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    /// Wrap a pool. Run [`crate::db::migrate`] once before first use.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All counters, ordered by key.
    pub async fn records(&self) -> Result<Vec<CounterRecord>> {
        let records = sqlx::query_as::<_, CounterRecord>(
            "SELECT model, field, count FROM identity_counters ORDER BY model, field",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

impl CounterStore for PgCounterStore {
    async fn increment(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(include_str!("../../sql/increment_counter.sql"))
            .bind(&key.model)
            .bind(&key.field)
            .bind(sequence.start_at)
            .bind(sequence.increment_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| overflow_or_storage(err, key))?;
        tracing::debug!("{}: counter advanced to {}", key, count);
        Ok(count)
    }

    async fn peek(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        let count = self.record(key).await?.map(|record| record.count);
        sequence
            .next_after(count)
            .ok_or_else(|| Error::Overflow { key: key.clone() })
    }

    async fn reset(&self, key: &CounterKey, sequence: Sequence) -> Result<i64> {
        let seed = sequence
            .seed()
            .ok_or_else(|| Error::Overflow { key: key.clone() })?;
        sqlx::query(include_str!("../../sql/reset_counter.sql"))
            .bind(&key.model)
            .bind(&key.field)
            .bind(seed)
            .execute(&self.pool)
            .await?;
        Ok(sequence.start_at)
    }

    async fn advance_to(&self, key: &CounterKey, value: i64) -> Result<()> {
        sqlx::query(include_str!("../../sql/advance_counter.sql"))
            .bind(&key.model)
            .bind(&key.field)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record(&self, key: &CounterKey) -> Result<Option<CounterRecord>> {
        let record =
            sqlx::query_as::<_, CounterRecord>(include_str!("../../sql/select_counter.sql"))
                .bind(&key.model)
                .bind(&key.field)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }
}

/// SQLSTATE `numeric_value_out_of_range`, raised when `count + step` leaves BIGINT.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

fn overflow_or_storage(err: sqlx::Error, key: &CounterKey) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            Error::Overflow { key: key.clone() }
        }
        _ => Error::Storage(err),
    }
}
