use serde::Deserialize;

use crate::counter::CounterKey;
use crate::error::{Error, Result};
use crate::sequence::Sequence;

/// Field numbered when a binding does not name one.
pub const DEFAULT_FIELD: &str = "_id";

/// Options accepted when attaching auto-increment to a model.
///
/// Either a bare model name, or a settings object. Deserializes from
/// `"User"` as well as `{"model": "User", "startAt": 3}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PluginOptions {
    Model(String),
    Settings(PluginSettings),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    pub model: Option<String>,
    pub field: Option<String>,
    pub start_at: Option<i64>,
    pub increment_by: Option<i64>,
    /// Counter name shared by several models. Defaults to the model name.
    pub counter: Option<String>,
    pub unique: Option<bool>,
    pub track_manual: Option<bool>,
}

impl From<&str> for PluginOptions {
    fn from(model: &str) -> Self {
        PluginOptions::Model(model.to_string())
    }
}

impl From<String> for PluginOptions {
    fn from(model: String) -> Self {
        PluginOptions::Model(model)
    }
}

impl From<PluginSettings> for PluginOptions {
    fn from(settings: PluginSettings) -> Self {
        PluginOptions::Settings(settings)
    }
}

/// Canonical, validated configuration of one binding.
#[derive(Debug, Clone)]
pub struct BindingConfig {
    /// Model (collection) whose documents are numbered.
    pub model: String,
    /// Document field that receives the issued value.
    pub field: String,
    pub start_at: i64,
    /// Step between issued values. Always positive.
    pub increment_by: i64,
    /// Counter name, when several models share one sequence.
    pub counter: Option<String>,
    /// Whether the host collection should reject duplicate values in `field`.
    pub unique: bool,
    /// Raise the counter past integers already present on new documents.
    /// Cannot be combined with `output_filter`.
    pub track_manual: bool,
    /// Applied to each issued count before it is written to the document.
    pub output_filter: Option<fn(i64) -> i64>,
}

impl BindingConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: DEFAULT_FIELD.to_string(),
            start_at: 0,
            increment_by: 1,
            counter: None,
            unique: true,
            track_manual: false,
            output_filter: None,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn start_at(mut self, start_at: i64) -> Self {
        self.start_at = start_at;
        self
    }

    pub fn increment_by(mut self, increment_by: i64) -> Self {
        self.increment_by = increment_by;
        self
    }

    pub fn counter(mut self, counter: impl Into<String>) -> Self {
        self.counter = Some(counter.into());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn track_manual(mut self, track_manual: bool) -> Self {
        self.track_manual = track_manual;
        self
    }

    pub fn output_filter(mut self, filter: fn(i64) -> i64) -> Self {
        self.output_filter = Some(filter);
        self
    }

    pub fn sequence(&self) -> Sequence {
        Sequence::new(self.start_at, self.increment_by)
    }

    /// Key of the counter this binding draws from.
    pub fn counter_key(&self) -> CounterKey {
        let name = self.counter.as_deref().unwrap_or(&self.model);
        CounterKey::new(name, self.field.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Configuration("model name is required".to_string()));
        }
        if self.field.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "field name for model `{}` cannot be empty",
                self.model
            )));
        }
        if matches!(&self.counter, Some(name) if name.trim().is_empty()) {
            return Err(Error::Configuration(format!(
                "counter name for model `{}` cannot be empty",
                self.model
            )));
        }
        if self.increment_by <= 0 {
            return Err(Error::Configuration(format!(
                "incrementBy for model `{}` must be positive, got {}",
                self.model, self.increment_by
            )));
        }
        if self.track_manual && self.output_filter.is_some() {
            // Manual values are filtered output; the counter holds raw counts.
            return Err(Error::Configuration(format!(
                "trackManual cannot be combined with an output filter on model `{}`",
                self.model
            )));
        }
        if self.sequence().seed().is_none() {
            return Err(Error::Configuration(format!(
                "startAt {} is too small for incrementBy {}",
                self.start_at, self.increment_by
            )));
        }
        Ok(())
    }
}

impl TryFrom<PluginOptions> for BindingConfig {
    type Error = Error;

    fn try_from(options: PluginOptions) -> Result<Self> {
        let config = match options {
            PluginOptions::Model(model) => BindingConfig::new(model),
            PluginOptions::Settings(settings) => {
                let model = settings
                    .model
                    .ok_or_else(|| Error::Configuration("model name is required".to_string()))?;
                let defaults = BindingConfig::new(model);
                BindingConfig {
                    field: settings.field.unwrap_or(defaults.field.clone()),
                    start_at: settings.start_at.unwrap_or(defaults.start_at),
                    increment_by: settings.increment_by.unwrap_or(defaults.increment_by),
                    counter: settings.counter,
                    unique: settings.unique.unwrap_or(defaults.unique),
                    track_manual: settings.track_manual.unwrap_or(defaults.track_manual),
                    ..defaults
                }
            }
        };
        config.validate()?;
        Ok(config)
    }
}
