use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::BindingConfig;
use crate::counter::{CounterKey, CounterStore};
use crate::error::Result;

/// Assigns counter values to one model's documents as they are created.
#[derive(Debug)]
pub struct FieldBinder<S> {
    store: Arc<S>,
    config: BindingConfig,
    key: CounterKey,
}

impl<S> Clone for FieldBinder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S: CounterStore> FieldBinder<S> {
    /// Bind a validated configuration to a store.
    pub(crate) fn new(store: Arc<S>, config: BindingConfig) -> Self {
        let key = config.counter_key();
        Self { store, config, key }
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run before a document's first write.
    ///
    /// Assigns the next counter value to the bound field when the document is new and
    /// the field is absent or null, and returns the assigned value. Documents loaded
    /// from storage, or with the field already set, are left untouched.
    pub async fn before_create(
        &self,
        fields: &mut Map<String, Value>,
        is_new: bool,
    ) -> Result<Option<i64>> {
        if !is_new {
            return Ok(None);
        }

        match fields.get(&self.config.field) {
            None | Some(Value::Null) => {}
            Some(existing) => {
                if self.config.track_manual
                    && let Some(manual) = existing.as_i64()
                {
                    tracing::warn!(
                        "{}: manual value {} supplied, advancing counter",
                        self.key,
                        manual
                    );
                    self.store.advance_to(&self.key, manual).await?;
                }
                return Ok(None);
            }
        }

        let count = self.store.increment(&self.key, self.config.sequence()).await?;
        let value = match self.config.output_filter {
            Some(filter) => filter(count),
            None => count,
        };
        tracing::debug!("{}: issued {} for {}", self.key, value, self.config.model);
        fields.insert(self.config.field.clone(), Value::from(value));
        Ok(Some(value))
    }

    /// The value the next created document will receive, before any output filter.
    pub async fn next_count(&self) -> Result<i64> {
        self.store.peek(&self.key, self.config.sequence()).await
    }

    /// Rewind the counter as if no documents had been numbered yet.
    /// Returns the value the next created document will receive.
    pub async fn reset_count(&self) -> Result<i64> {
        let next = self.store.reset(&self.key, self.config.sequence()).await?;
        tracing::info!("{}: counter reset, next value {}", self.key, next);
        Ok(next)
    }
}
