use std::sync::Arc;

use crate::binder::FieldBinder;
use crate::config::{BindingConfig, PluginOptions};
use crate::counter::CounterStore;
use crate::error::{Error, Result};

/// Entry point for attaching auto-increment to models.
///
/// Holds the one counter store every binding shares. Construct it with
/// [`AutoIncrement::with_store`], or create it empty and call
/// [`AutoIncrement::initialize`] before attaching any model.
#[derive(Debug)]
pub struct AutoIncrement<S> {
    store: Option<Arc<S>>,
}

impl<S: CounterStore> AutoIncrement<S> {
    pub fn new() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: S) -> Self {
        Self {
            store: Some(Arc::new(store)),
        }
    }

    /// Install the counter store. A second call replaces the store for bindings
    /// attached afterwards; existing binders keep the store they were built with.
    pub fn initialize(&mut self, store: S) {
        self.store = Some(Arc::new(store));
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Result<&Arc<S>> {
        self.store.as_ref().ok_or(Error::NotInitialized)
    }

    /// Attach to a model using a bare model name or a settings object.
    pub fn attach(&self, options: impl Into<PluginOptions>) -> Result<FieldBinder<S>> {
        let config = BindingConfig::try_from(options.into())?;
        self.attach_config(config)
    }

    /// Attach with a fully built configuration (needed for `output_filter`).
    pub fn attach_config(&self, config: BindingConfig) -> Result<FieldBinder<S>> {
        let store = self.store()?;
        config.validate()?;
        tracing::info!(
            "auto-increment attached to {}.{} (counter {}, start {}, step {})",
            config.model,
            config.field,
            config.counter_key(),
            config.start_at,
            config.increment_by
        );
        Ok(FieldBinder::new(Arc::clone(store), config))
    }
}

impl<S: CounterStore> Default for AutoIncrement<S> {
    fn default() -> Self {
        Self::new()
    }
}
