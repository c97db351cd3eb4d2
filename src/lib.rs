pub mod binder;
pub mod config;
pub mod counter;
pub mod db;
pub mod error;
pub mod model;
pub mod plugin;
pub mod sequence;

pub use binder::FieldBinder;
pub use config::{BindingConfig, PluginOptions, PluginSettings};
pub use counter::{CounterKey, CounterRecord, CounterStore, MemoryCounterStore};
pub use db::{PgCollection, PgCounterStore};
pub use error::{Error, Result};
pub use model::{Collection, Document, MemoryCollection, Model};
pub use plugin::AutoIncrement;
pub use sequence::Sequence;
