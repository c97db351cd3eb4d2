use thiserror::Error;

use crate::counter::CounterKey;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid auto-increment configuration: {0}")]
    Configuration(String),
    #[error("auto-increment has not been initialized with a counter store")]
    NotInitialized,
    #[error("counter storage failed: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("counter {key} overflowed")]
    Overflow { key: CounterKey },
    #[error("duplicate value {value} for unique field `{field}` in `{model}`")]
    DuplicateKey {
        model: String,
        field: String,
        value: serde_json::Value,
    },
}
